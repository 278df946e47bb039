use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8vm::prelude::*;

/// Tight loop that counts V0 down from 255, draws a digit, and starts over.
#[rustfmt::skip]
const COUNTDOWN: &[u8] = &[
    0x60, 0xFF, // 0200: LD V0, 0xFF
    0x70, 0xFF, // 0202: ADD V0, 0xFF
    0xF0, 0x29, // 0204: LD F, V0
    0xD1, 0x25, // 0206: DRW V1, V2, 5
    0x30, 0x00, // 0208: SE V0, 0
    0x12, 0x02, // 020A: JP 0x202
    0x12, 0x00, // 020C: JP 0x200
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    vm.load_rom(COUNTDOWN).unwrap();
    let mut keys = Keypad::new();

    c.bench_function("countdown bytecode", |b| {
        b.iter(|| {
            let step_count = black_box(1000_usize);
            black_box(vm.run_steps(step_count, &mut keys))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
