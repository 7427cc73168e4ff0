use std::cell::Cell;
use std::cmp::Ordering;

use tarray::{ContentType, ElementKind, Numeric, TypedArray, compare_default};

fn element(kind: ElementKind, raw: u8) -> Numeric {
    match kind.content_type() {
        ContentType::Number => Numeric::Number(raw as i8 as f64 * 1.5),
        ContentType::BigInt => Numeric::BigInt(raw as i8 as i128),
    }
}

fn check(view: &TypedArray) {
    if view.is_detached() {
        assert_eq!(view.len(), 0);
        assert!(view.to_vec().is_err());
    } else {
        assert_eq!(view.to_vec().map(|v| v.len()).ok(), Some(view.len()));
        assert!(view.byte_offset() + view.byte_length() <= view.buffer().byte_length());
    }
}

/// Runs the operation script encoded in `data` against a small set of
/// aliasing views. Every operation may fail; none may panic or leave a view
/// reading outside its buffer.
pub fn test(data: &[u8]) {
    let Some((&head, script)) = data.split_first() else {
        return;
    };
    let kind = ElementKind::ALL[head as usize % ElementKind::ALL.len()];
    let root = TypedArray::new(kind, (head >> 4) as usize * 4 + 1);
    let mut views = vec![root.clone()];

    for op in script.chunks_exact(4) {
        let view = views[op[1] as usize % views.len()].clone();
        let (a, b) = (op[2] as i8 as i64, op[3] as i8 as i64);
        let end = (b != 0).then_some(b);
        match op[0] % 16 {
            0 => {
                let _ = view.fill(element(kind, op[2]), b, None);
            }
            1 => {
                let _ = view.copy_within(a, b, None);
            }
            2 => {
                let _ = view.reverse();
            }
            3 => {
                if let Ok(slice) = view.slice(a, end) {
                    views.push(slice);
                }
            }
            4 => {
                if let Ok(sub) = view.subarray(a, end) {
                    views.push(sub);
                }
            }
            5 => {
                let source = views[op[2] as usize % views.len()].clone();
                let _ = view.set_typed(&source, b);
            }
            6 => {
                let values = (0..op[2] % 8).map(|x| element(kind, x));
                let _ = view.set_values(values, b);
            }
            7 => {
                let _ = view.sort();
            }
            8 => {
                let calls = Cell::new(0u8);
                let buffer = view.buffer().clone();
                let _ = view.sort_by(|x, y| {
                    calls.set(calls.get().wrapping_add(1));
                    if calls.get() == op[2] {
                        let _ = buffer.detach();
                    }
                    Ok(if op[3] & 1 == 0 { compare_default(x, y) } else { Ordering::Less })
                });
            }
            9 => {
                let _ = view.index_of(element(kind, op[2]), Some(b));
                let _ = view.last_index_of(element(kind, op[2]), end);
                let _ = view.includes(element(kind, op[2]), Some(b));
            }
            10 => {
                let _ = view.join(None);
            }
            11 => {
                let _ = view.some(|_, k, v| {
                    if k == op[2] as usize {
                        let _ = v.buffer().detach();
                    }
                    Ok(false)
                });
            }
            12 => {
                let _ = view.buffer().slice(a, end);
            }
            13 => {
                let other = ElementKind::ALL[op[2] as usize % ElementKind::ALL.len()];
                if let Ok(mapped) = TypedArray::of(other, view.to_vec().unwrap_or_default()) {
                    let _ = view.set_typed(&mapped, b);
                }
            }
            14 => {
                let _ = view.filter(|x, _, _| Ok(x.is_truthy()));
                let _ = view.map(|x, _, _| Ok(x));
            }
            _ => {
                if op[2] == 0xff {
                    let _ = root.buffer().detach();
                }
            }
        }
        for view in &views {
            check(view);
        }
    }
}
