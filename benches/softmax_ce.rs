use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use fakespeech::layers::LinearT;
use fakespeech::math::{self, Matrix};
use fakespeech::optim::Adam;

// Loss plus dense-head update at the training shape: 64 hidden activations of
// width 128 mapped to two class logits.
fn bench_loss_step(c: &mut Criterion) {
    let batch = 64;
    let mut rng = rand::thread_rng();
    let hidden = Matrix::from_vec(
        batch,
        128,
        (0..batch * 128).map(|_| rng.gen_range(0.0..1.0)).collect(),
    );
    let targets: Vec<usize> = (0..batch).map(|_| rng.gen_range(0..2)).collect();
    let mut head = LinearT::new(128, 2);
    let mut opt = Adam::default();

    let logits = head.forward(&hidden).unwrap();
    c.bench_function("softmax_ce_batch64x2", |b| {
        b.iter(|| black_box(math::softmax_cross_entropy(black_box(&logits), black_box(&targets))));
    });

    c.bench_function("loss_backward_adam_head_batch64", |b| {
        b.iter(|| {
            let logits = head.forward_train(black_box(&hidden)).unwrap();
            let (loss, grad) = math::softmax_cross_entropy(&logits, &targets);
            head.zero_grad();
            black_box(head.backward(&grad));
            opt.step(&mut [&mut head]);
            black_box(loss);
        });
    });
}

criterion_group!(benches, bench_loss_step);
criterion_main!(benches);
