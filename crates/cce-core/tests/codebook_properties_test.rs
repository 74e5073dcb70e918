//! Statistical properties of the bipolar vector algebra at D = 10,000.

use cce_core::{Codebook, ParticleCategory, ParticleField, Particle};

const WORDS: [&str; 8] = [
    "Mut", "Kraft", "Angst", "Hoffnung", "Freiheit", "Zweifel", "Licht", "Schatten",
];

fn codebook() -> Codebook {
    Codebook::new(10_000, 42).expect("valid codebook")
}

fn is_bipolar(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 1.0 || *x == -1.0)
}

#[test]
fn unrelated_symbols_are_nearly_orthogonal() {
    let cb = codebook();
    let mut worst = 0.0f32;
    for (i, a) in WORDS.iter().enumerate() {
        for b in &WORDS[i + 1..] {
            let sim = Codebook::similarity(&cb.encode(a), &cb.encode(b));
            worst = worst.max(sim.abs());
        }
    }
    println!("STATE: worst |similarity| over {} pairs = {:.4}", WORDS.len() * (WORDS.len() - 1) / 2, worst);
    assert!(worst < 0.05);
    println!("[EVIDENCE] pairwise near-orthogonality - SUCCESS");
}

#[test]
fn bind_unbind_recovers_every_filler() {
    let cb = codebook();
    let role = cb.encode("__rel_CAUSES__");
    for word in WORDS {
        let filler = cb.encode(word);
        let bound = Codebook::bind(&role, &filler);
        assert!(is_bipolar(&bound));
        assert!(Codebook::similarity(&bound, &filler).abs() < 0.06);
        assert!(Codebook::similarity(&Codebook::bind(&bound, &role), &filler) > 0.99);
    }
}

#[test]
fn bundle_then_cleanup_finds_members() {
    let cb = codebook();
    let members: Vec<Vec<f32>> = WORDS[..3].iter().map(|w| cb.encode(w)).collect();
    for w in &WORDS[3..] {
        cb.encode(w);
    }
    let bundled = cb.bundle(&members);
    let top = cb.cleanup_top_k(&bundled, 3);
    let found: Vec<&str> = top.iter().map(|(s, _)| s.as_str()).collect();
    println!("STATE: top-3 of bundle(Mut, Kraft, Angst) = {:?}", top);
    for w in ["mut", "kraft", "angst"] {
        assert!(found.contains(&w), "{} missing", w);
    }
}

#[test]
fn decompose_keeps_particles_close_to_source() {
    let cb = codebook();
    for word in WORDS {
        let base = cb.encode(word);
        for p in cb.decompose(word, 6) {
            assert!(is_bipolar(&p));
            assert!(Codebook::similarity(&p, &base) > 0.3);
        }
    }
}

#[test]
fn two_concepts_give_at_least_two_peaks() {
    let cb = codebook();
    let mut field = ParticleField::new();
    for word in ["Mut", "Angst"] {
        for (i, v) in cb.decompose(word, 5).into_iter().enumerate() {
            field.add(Particle::new(v, format!("{}#{}", word, i), ParticleCategory::Intent));
        }
    }
    let peaks = field.compute_density(0.3);
    println!("STATE: peaks={}", peaks.len());
    assert!(peaks.len() >= 2);
}
