use criterion::{black_box, criterion_group, criterion_main, Criterion};
use minnow_rs::VirtualMachine;

const ARITHMETIC_LOOP: &str = r#"
var sum = 0;
for (var i = 0; i < 10000; i = i + 1) {
  sum = sum + i * 2 - 1;
}
"#;

const NESTED_LOCALS: &str = r#"
var total = 0;
for (var i = 0; i < 1000; i = i + 1) {
  var a = i;
  {
    var b = a + 1;
    {
      var c = b + 1;
      total = total + c;
    }
  }
}
"#;

const STRING_BUILDING: &str = r#"
var parts = "";
for (var i = 0; i < 200; i = i + 1) {
  parts = parts + "x";
}
"#;

fn interpreter_benchmark(c: &mut Criterion) {
    c.bench_function("arithmetic loop", |b| {
        b.iter(|| {
            let mut vm = VirtualMachine::new();
            vm.interpret(black_box(ARITHMETIC_LOOP));
        })
    });

    c.bench_function("nested locals", |b| {
        b.iter(|| {
            let mut vm = VirtualMachine::new();
            vm.interpret(black_box(NESTED_LOCALS));
        })
    });

    c.bench_function("string building", |b| {
        b.iter(|| {
            let mut vm = VirtualMachine::new();
            vm.interpret(black_box(STRING_BUILDING));
        })
    });
}

criterion_group!(benches, interpreter_benchmark);
criterion_main!(benches);
