use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            tarray_fuzz::test(data);
        });
    }
}
