use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reg_nfa::{Matcher, Regex};

const PATTERN: &str = "(he)*lo*l( wor.d)?";

fn do_the_work(regex: &Regex, texts: &[String], expected: &[bool]) {
    let actual: Vec<bool> = texts.iter().map(|text| regex.is_match(text)).collect();
    assert_eq!(expected, actual.as_slice())
}

fn criterion_benchmark_regex_nfa(c: &mut Criterion) {
    let texts: Vec<String> = (0..200)
        .map(|n| format!("{}l{}l world", "he".repeat(n % 17), "o".repeat(n % 23)))
        .collect();
    let oracle = regex::Regex::new(&format!("^(?:{})$", PATTERN)).unwrap();
    let expected: Vec<bool> = texts.iter().map(|text| oracle.is_match(text)).collect();

    let regex = Regex::new(PATTERN).unwrap();
    c.bench_function("match greetings", |b| {
        b.iter(|| do_the_work(black_box(&regex), black_box(&texts), black_box(&expected)))
    });
    c.bench_function("compile pattern", |b| {
        b.iter(|| Regex::new(black_box(PATTERN)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark_regex_nfa);
criterion_main!(benches);
