//! Tests for the dynamically typed method surface

use std::{cell::Cell, rc::Rc};

use tarray::{
    ArrayBuffer, ElementKind, Error, ErrorKind, Function, Numeric, TypedArray, Value,
    prototype::{self, Method, invoke, invoke_buffer_slice},
};

fn view_of(kind: ElementKind, items: &[f64]) -> Value {
    TypedArray::of(kind, items.iter().copied()).unwrap().into()
}

fn numbers(value: &Value) -> Vec<f64> {
    let view = value.as_typed_array().expect("a typed array");
    view.to_vec().unwrap().iter().map(Numeric::as_f64).collect()
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(x) => *x,
        other => panic!("expected a number, got {other:?}"),
    }
}

fn identity() -> Value {
    Function::new("identity", |_, args| Ok(args.first().cloned().unwrap_or_default())).into()
}

#[test]
fn test_method_names() {
    for method in Method::ALL {
        assert_eq!(Method::from_name(method.name()), Some(method));
    }
    assert_eq!(Method::from_name("findLast"), None);
    assert_eq!(Method::ALL.iter().filter(|m| m.takes_callback()).count(), 9);
    assert!(Method::ReduceRight.takes_callback());
    assert!(!Method::Sort.takes_callback());
}

#[test]
fn test_receiver_must_be_a_view() {
    let receivers = [
        Value::Undefined,
        Value::Number(1.0),
        Value::from("Int8Array"),
        Value::from(vec![Value::Number(1.0)]),
        Value::from(ArrayBuffer::new(8)),
    ];
    for this in &receivers {
        for method in Method::ALL {
            let err = invoke(method, this, &[identity()]).unwrap_err();
            assert!(matches!(err, Error::NotATypedArray), "{} on {this:?}", method.name());
            assert_eq!(err.kind(), ErrorKind::TypeError);
        }
    }
}

#[test]
fn test_callback_checks() {
    let view = view_of(ElementKind::Int8, &[1.0, 2.0]);
    for method in Method::ALL.into_iter().filter(|m| m.takes_callback()) {
        let missing = invoke(method, &view, &[]).unwrap_err();
        assert!(matches!(missing, Error::MissingArgument(name) if name == method.name()));

        let not_callable = invoke(method, &view, &[Value::Number(3.0)]).unwrap_err();
        assert!(matches!(not_callable, Error::NotCallable(ref what) if what == "3"));
        assert_eq!(not_callable.to_string(), "3 is not a function");
    }
}

#[test]
fn test_callback_checks_come_after_the_attachment_check() {
    let view = TypedArray::new(ElementKind::Int8, 2);
    view.buffer().detach().unwrap();
    let this = Value::from(view);
    assert!(matches!(invoke(Method::Map, &this, &[]), Err(Error::Detached)));
    assert!(matches!(invoke(Method::Every, &this, &[Value::Null]), Err(Error::Detached)));
}

#[test]
fn test_callback_receives_element_index_view_and_this() {
    let view = view_of(ElementKind::Uint8, &[5.0, 6.0]);
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let expected = view.clone();
    let check = Function::new("check", move |this, args| {
        assert_eq!(this, &Value::from("ctx"));
        let k = number(&args[1]);
        assert_eq!(number(&args[0]), 5.0 + k);
        assert_eq!(args[2], expected);
        counter.set(counter.get() + 1);
        Ok(Value::Undefined)
    });

    let result = invoke(Method::ForEach, &view, &[check.into(), Value::from("ctx")]).unwrap();
    assert_eq!(result, Value::Undefined);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_predicates() {
    let view = view_of(ElementKind::Int16, &[1.0, -2.0, 3.0, -4.0]);
    let negative: Value =
        Function::new("negative", |_, args| Ok(Value::from(args[0].to_number()? < 0.0))).into();

    assert_eq!(invoke(Method::Some, &view, &[negative.clone()]).unwrap(), Value::Boolean(true));
    assert_eq!(invoke(Method::Every, &view, &[negative.clone()]).unwrap(), Value::Boolean(false));
    assert_eq!(invoke(Method::Find, &view, &[negative.clone()]).unwrap(), Value::Number(-2.0));
    assert_eq!(invoke(Method::FindIndex, &view, &[negative.clone()]).unwrap(), Value::Number(1.0));

    let filtered = invoke(Method::Filter, &view, &[negative]).unwrap();
    assert_eq!(numbers(&filtered), [-2.0, -4.0]);

    // truthiness of the callback result, not strict booleans
    let never: Value = Function::new("never", |_, _| Ok(Value::from(""))).into();
    assert_eq!(invoke(Method::Find, &view, &[never.clone()]).unwrap(), Value::Undefined);
    assert_eq!(invoke(Method::FindIndex, &view, &[never]).unwrap(), Value::Number(-1.0));
}

#[test]
fn test_map_converts_results() {
    let view = view_of(ElementKind::Uint8, &[1.0, 2.0, 3.0]);
    let stringify: Value = Function::new("stringify", |_, args| {
        Ok(Value::from(format!("{}0", args[0].to_js_string()?).as_str()))
    })
    .into();
    let mapped = invoke(Method::Map, &view, &[stringify]).unwrap();
    assert_eq!(numbers(&mapped), [10.0, 20.0, 30.0]);
    assert_ne!(mapped, view);
}

#[test]
fn test_reduce() {
    let view = view_of(ElementKind::Int32, &[1.0, 2.0, 3.0]);
    let concat: Value = Function::new("concat", |this, args| {
        assert_eq!(this, &Value::Undefined);
        let acc = args[0].to_js_string()?;
        Ok(Value::from(format!("{acc}{}", args[1].to_js_string()?).as_str()))
    })
    .into();

    let left = invoke(Method::Reduce, &view, &[concat.clone()]).unwrap();
    assert_eq!(left, Value::from("123"));
    let right = invoke(Method::ReduceRight, &view, &[concat.clone(), Value::from(">")]).unwrap();
    assert_eq!(right, Value::from(">321"));

    let empty = view_of(ElementKind::Int32, &[]);
    let err = invoke(Method::Reduce, &empty, &[concat.clone()]).unwrap_err();
    assert!(matches!(err, Error::EmptyReduce));
    assert_eq!(
        invoke(Method::ReduceRight, &empty, &[concat, Value::Null]).unwrap(),
        Value::Null
    );
}

#[test]
fn test_searches() {
    let view = view_of(ElementKind::Float64, &[1.0, f64::NAN, -0.0, 1.0]);

    assert_eq!(invoke(Method::IndexOf, &view, &[Value::Number(1.0)]).unwrap(), Value::Number(0.0));
    assert_eq!(invoke(Method::IndexOf, &view, &[Value::Number(0.0)]).unwrap(), Value::Number(2.0));
    assert_eq!(
        invoke(Method::IndexOf, &view, &[Value::Number(f64::NAN)]).unwrap(),
        Value::Number(-1.0)
    );
    assert_eq!(
        invoke(Method::Includes, &view, &[Value::Number(f64::NAN)]).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        invoke(Method::LastIndexOf, &view, &[Value::Number(1.0)]).unwrap(),
        Value::Number(3.0)
    );

    // no coercion of the search value
    assert_eq!(invoke(Method::IndexOf, &view, &[Value::from("1")]).unwrap(), Value::Number(-1.0));
    assert_eq!(
        invoke(Method::Includes, &view, &[Value::BigInt(1)]).unwrap(),
        Value::Boolean(false)
    );

    // an explicit undefined from-index is 0, except for lastIndexOf
    let args = [Value::Number(1.0), Value::Undefined];
    assert_eq!(invoke(Method::IndexOf, &view, &args).unwrap(), Value::Number(0.0));
    assert_eq!(invoke(Method::LastIndexOf, &view, &args).unwrap(), Value::Number(3.0));
    let absent = [Value::Number(1.0)];
    assert_eq!(
        invoke(Method::LastIndexOf, &view, &absent).unwrap(),
        invoke(Method::LastIndexOf, &view, &args).unwrap()
    );
    let from_start = [Value::Number(1.0), Value::Null];
    assert_eq!(invoke(Method::LastIndexOf, &view, &from_start).unwrap(), Value::Number(0.0));

    let args = [Value::Number(1.0), Value::Number(-2.0)];
    assert_eq!(invoke(Method::IndexOf, &view, &args).unwrap(), Value::Number(3.0));
}

#[test]
fn test_searches_on_detached_view() {
    let view = TypedArray::new(ElementKind::Int8, 2);
    view.buffer().detach().unwrap();
    let this = Value::from(view);
    for method in [Method::IndexOf, Method::LastIndexOf, Method::Includes] {
        assert!(matches!(invoke(method, &this, &[Value::from("x")]), Err(Error::Detached)));
        assert!(matches!(invoke(method, &this, &[Value::Number(0.0)]), Err(Error::Detached)));
    }
}

#[test]
fn test_methods_returning_the_receiver() {
    let view = view_of(ElementKind::Int8, &[3.0, 1.0, 2.0]);
    for (method, args) in [
        (Method::CopyWithin, vec![Value::Number(0.0), Value::Number(1.0)]),
        (Method::Fill, vec![Value::from("4"), Value::Number(2.0)]),
        (Method::Reverse, vec![]),
        (Method::Sort, vec![]),
    ] {
        assert_eq!(invoke(method, &view, &args).unwrap(), view);
    }
    // [1, 2, 2] -> fill -> [1, 2, 4] -> reverse -> sort
    assert_eq!(numbers(&view), [1.0, 2.0, 4.0]);
}

#[test]
fn test_fill_coerces_per_content_type() {
    let view = view_of(ElementKind::Int8, &[0.0, 0.0]);
    let err = invoke(Method::Fill, &view, &[Value::BigInt(1)]).unwrap_err();
    assert!(matches!(err, Error::ContentTypeMismatch(..)));

    let big = Value::from(TypedArray::new(ElementKind::BigInt64, 2));
    invoke(Method::Fill, &big, &[Value::from("-7"), Value::Undefined, Value::Number(1.0)]).unwrap();
    let values = big.as_typed_array().unwrap().to_vec().unwrap();
    assert_eq!(values, [Numeric::BigInt(-7), Numeric::BigInt(0)]);
}

#[test]
fn test_sort_with_dynamic_comparator() {
    let view = view_of(ElementKind::Uint16, &[1.0, 30.0, 4.0, 100.0]);
    let descending: Value = Function::new("descending", |_, args| {
        Ok(Value::Number(args[1].to_number()? - args[0].to_number()?))
    })
    .into();
    invoke(Method::Sort, &view, &[descending]).unwrap();
    assert_eq!(numbers(&view), [100.0, 30.0, 4.0, 1.0]);

    // NaN and non-numeric results compare as equal
    let confused: Value = Function::new("confused", |_, _| Ok(Value::from("?"))).into();
    invoke(Method::Sort, &view, &[confused]).unwrap();
    let mut values = numbers(&view);
    values.sort_by(f64::total_cmp);
    assert_eq!(values, [1.0, 4.0, 30.0, 100.0]);

    let err = invoke(Method::Sort, &view, &[Value::Number(1.0)]).unwrap_err();
    assert!(matches!(err, Error::NotCallable(_)));
}

#[test]
fn test_set_sources() {
    let view = view_of(ElementKind::Int8, &[0.0; 4]);
    let array = Value::from(vec![Value::Number(1.0), Value::from("2"), Value::Boolean(true)]);
    assert_eq!(invoke(Method::Set, &view, &[array, Value::Number(1.0)]).unwrap(), Value::Undefined);
    assert_eq!(numbers(&view), [0.0, 1.0, 2.0, 1.0]);

    let typed = view_of(ElementKind::Float32, &[-1.0, -2.0]);
    invoke(Method::Set, &view, &[typed]).unwrap();
    assert_eq!(numbers(&view), [-1.0, -2.0, 2.0, 1.0]);

    invoke(Method::Set, &view, &[Value::from("98"), Value::Number(2.0)]).unwrap();
    assert_eq!(numbers(&view), [-1.0, -2.0, 9.0, 8.0]);

    let err = invoke(Method::Set, &view, &[Value::Undefined]).unwrap_err();
    assert!(matches!(err, Error::InvalidConversion("object")));

    let args = [Value::from(Vec::<Value>::new()), Value::Number(-1.0)];
    let err = invoke(Method::Set, &view, &args).unwrap_err();
    assert!(matches!(err, Error::NegativeOffset));
    assert_eq!(err.kind(), ErrorKind::RangeError);

    let err = invoke(Method::Set, &view, &[Value::from("12345")]).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds));
}

#[test]
fn test_slice_and_subarray() {
    let view = view_of(ElementKind::Uint32, &[1.0, 2.0, 3.0, 4.0]);

    let slice = invoke(Method::Slice, &view, &[Value::from("1"), Value::Number(-1.0)]).unwrap();
    assert_eq!(numbers(&slice), [2.0, 3.0]);

    let sub = invoke(Method::Subarray, &view, &[Value::Number(2.0), Value::Undefined]).unwrap();
    assert_eq!(numbers(&sub), [3.0, 4.0]);
    let sub = sub.as_typed_array().unwrap();
    assert!(sub.buffer().ptr_eq(view.as_typed_array().unwrap().buffer()));
}

#[test]
fn test_join_and_to_string() {
    let view = view_of(ElementKind::Float64, &[1.0, 0.5, f64::INFINITY]);
    assert_eq!(invoke(Method::Join, &view, &[]).unwrap(), Value::from("1,0.5,Infinity"));
    assert_eq!(
        invoke(Method::Join, &view, &[Value::Null]).unwrap(),
        Value::from("1null0.5nullInfinity")
    );
    assert_eq!(invoke(Method::ToString, &view, &[]).unwrap(), Value::from("1,0.5,Infinity"));
}

#[test]
fn test_callback_errors_propagate() {
    let view = view_of(ElementKind::Int8, &[1.0, 2.0]);
    let throws: Value =
        Function::new("throws", |_, _| Err(Error::Thrown(Value::Number(42.0)))).into();
    for method in Method::ALL.into_iter().filter(|m| m.takes_callback()) {
        let err = invoke(method, &view, &[throws.clone(), Value::Number(0.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Thrown, "{}", method.name());
        assert!(matches!(err, Error::Thrown(Value::Number(x)) if x == 42.0));
    }
    let err = invoke(Method::Sort, &view, &[throws]).unwrap_err();
    assert_eq!(err.to_string(), "uncaught 42");
}

#[test]
fn test_detach_inside_callback() {
    let view = TypedArray::of(ElementKind::Uint8, [1, 2, 3]).unwrap();
    let buffer = view.buffer().clone();
    let detach: Value = Function::new("detach", move |_, _| {
        let _ = buffer.detach();
        Ok(Value::Boolean(false))
    })
    .into();
    let this = Value::from(view);
    assert!(matches!(invoke(Method::Some, &this, &[detach]), Err(Error::Detached)));
}

#[test]
fn test_from() {
    let source = Value::from(vec![Value::Number(1.0), Value::from("2"), Value::Undefined]);
    let plain =
        prototype::from(ElementKind::Int16, &source, &Value::Undefined, &Value::Undefined).unwrap();
    assert_eq!(plain.len(), 3);
    assert_eq!(plain.to_vec().unwrap()[..2], [Numeric::Number(1.0), Numeric::Number(2.0)]);

    let add_index: Value = Function::new("addIndex", |this, args| {
        let scale = this.to_number()?;
        Ok(Value::Number(args[0].to_number()? * scale + args[1].to_number()?))
    })
    .into();
    let chars = Value::from("123");
    let mapped =
        prototype::from(ElementKind::Float64, &chars, &add_index, &Value::Number(10.0)).unwrap();
    assert_eq!(
        mapped.to_vec().unwrap(),
        [10.0, 21.0, 32.0].map(Numeric::Number)
    );

    let typed = Value::from(TypedArray::of(ElementKind::Uint8, [7, 8]).unwrap());
    let copy = prototype::from(ElementKind::Uint8, &typed, &identity(), &Value::Undefined).unwrap();
    assert!(!copy.ptr_eq(typed.as_typed_array().unwrap()));
    assert_eq!(copy.join(None).unwrap(), "7,8");

    let err = prototype::from(ElementKind::Int8, &source, &Value::Number(1.0), &Value::Undefined);
    assert!(matches!(err, Err(Error::NotCallable(_))));
    let err =
        prototype::from(ElementKind::Int8, &Value::Null, &Value::Undefined, &Value::Undefined);
    assert!(matches!(err, Err(Error::InvalidConversion("object"))));

    let empty = prototype::from(
        ElementKind::Int8,
        &Value::Number(5.0),
        &Value::Undefined,
        &Value::Undefined,
    );
    assert_eq!(empty.unwrap().len(), 0);
}

#[test]
fn test_of() {
    let view = prototype::of(
        ElementKind::Uint8Clamped,
        &[Value::Number(300.0), Value::from("2"), Value::Boolean(true), Value::Null],
    )
    .unwrap();
    assert_eq!(view.join(None).unwrap(), "255,2,1,0");

    let big =
        prototype::of(ElementKind::BigUint64, &[Value::from("18446744073709551615")]).unwrap();
    assert_eq!(big.get(0).unwrap(), Numeric::BigInt(u64::MAX as i128));

    assert!(matches!(
        prototype::of(ElementKind::BigInt64, &[Value::Number(1.0)]),
        Err(Error::ContentTypeMismatch(..))
    ));
}

#[test]
fn test_buffer_slice() {
    let view = TypedArray::of(ElementKind::Uint8, [1, 2, 3, 4]).unwrap();
    let buffer = Value::from(view.buffer().clone());

    let copy = invoke_buffer_slice(&buffer, &[Value::Number(1.0), Value::Undefined]).unwrap();
    let Value::ArrayBuffer(copy) = copy else {
        panic!("expected a buffer");
    };
    assert_eq!(copy.to_vec().unwrap(), [2, 3, 4]);

    let err = invoke_buffer_slice(&Value::from(view), &[]).unwrap_err();
    assert!(matches!(err, Error::NotAnArrayBuffer));
    assert_eq!(err.kind(), ErrorKind::TypeError);
}
