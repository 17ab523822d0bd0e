// ============================================================
// Layer 4 - Example Samplers
// ============================================================
// The training loop draws one example per iteration, with
// replacement. There are no epochs and no shuffling: iteration
// 70 000 may well see a name iteration 12 already saw.
//
//   UniformSampler  -> every example equally likely
//   BalancedSampler -> pick a category uniformly, then a name
//                      inside it (rare languages get seen as
//                      often as common ones)

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::category::{CategorySet, NameExample};
use crate::domain::traits::ExampleSampler;

/// Uniform choice over a fixed list of examples.
pub struct UniformSampler<T> {
    items: Vec<T>,
}

impl<T: Clone> UniformSampler<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Clone> ExampleSampler for UniformSampler<T> {
    type Item = T;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        self.items.choose(rng).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Category first, then a name within it.
pub struct BalancedSampler<'a> {
    set:       &'a CategorySet,
    // categories with no names can never be drawn
    populated: Vec<usize>,
}

impl<'a> BalancedSampler<'a> {
    pub fn new(set: &'a CategorySet) -> Self {
        let populated = (0..set.len())
            .filter(|&i| !set.lines_at(i).is_empty())
            .collect();
        Self { set, populated }
    }
}

impl ExampleSampler for BalancedSampler<'_> {
    type Item = NameExample;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NameExample> {
        let &index   = self.populated.choose(rng)?;
        let name     = self.set.lines_at(index).choose(rng)?;
        let category = self.set.category(index).ok()?;
        Some(NameExample::new(index, category, name.clone()))
    }

    fn len(&self) -> usize {
        self.set.example_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn skewed_set() -> CategorySet {
        let mut set = CategorySet::new();
        set.insert("big", (0..99).map(|i| format!("Name{i}")).collect());
        set.insert("empty", Vec::new());
        set.insert("small", vec!["Solo".to_string()]);
        set
    }

    #[test]
    fn test_uniform_sampler_empty() {
        let s: UniformSampler<u32> = UniformSampler::new(Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(s.sample(&mut rng).is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn test_uniform_sampler_follows_population() {
        let examples = skewed_set().to_examples();
        let s        = UniformSampler::new(examples);
        let mut rng  = StdRng::seed_from_u64(7);

        let small = (0..2000)
            .filter(|_| s.sample(&mut rng).unwrap().category == "small")
            .count();
        // expected 20 of 2000
        assert!(small < 100, "small drawn {small} times");
    }

    #[test]
    fn test_balanced_sampler_evens_categories() {
        let set     = skewed_set();
        let s       = BalancedSampler::new(&set);
        let mut rng = StdRng::seed_from_u64(7);

        let mut small = 0;
        for _ in 0..2000 {
            let ex = s.sample(&mut rng).unwrap();
            assert_ne!(ex.category, "empty");
            assert_eq!(set.category(ex.category_index).unwrap(), ex.category);
            if ex.category == "small" {
                small += 1;
            }
        }
        // expected 1000 of 2000
        assert!((800..1200).contains(&small), "small drawn {small} times");
    }

    #[test]
    fn test_same_seed_same_draws() {
        let s = UniformSampler::new((0..50).collect::<Vec<u32>>());
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        let xs: Vec<_> = (0..20).map(|_| s.sample(&mut a).unwrap()).collect();
        let ys: Vec<_> = (0..20).map(|_| s.sample(&mut b).unwrap()).collect();
        assert_eq!(xs, ys);
    }
}
