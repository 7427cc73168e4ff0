#[macro_use]
extern crate afl;

fn main() {
    fuzz!(|data: &[u8]| {
        tarray_fuzz::test(data);
    });
}
