//! Randomized retain/release sequences never leak or double-free a block.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rtk_core::Signal;
use rtk_mem::{EventPools, EventRef};

const BLOCKS: usize = 6;

#[test]
fn random_retain_release_returns_every_block() {
    for seed in 0..32u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let pools = EventPools::builder().pool(16, BLOCKS).build().unwrap();
        let mut held: Vec<EventRef> = Vec::new();

        for step in 0..400 {
            match rng.gen_range(0..3) {
                0 => {
                    let payload = [step as u8; 4];
                    if let Some(event) = pools.try_allocate(Signal(10), &payload, 0) {
                        held.push(event);
                    } else {
                        assert!(pools.stats(1).is_exhausted());
                    }
                }
                1 if !held.is_empty() => {
                    let index = rng.gen_range(0..held.len());
                    let copy = pools.retain(&held[index]);
                    held.push(copy);
                }
                _ if !held.is_empty() => {
                    let index = rng.gen_range(0..held.len());
                    pools.release(held.swap_remove(index));
                }
                _ => {}
            }

            let distinct = {
                let mut blocks: Vec<_> = held.iter().filter_map(EventRef::block).collect();
                blocks.sort_by_key(|block| block.index());
                blocks.dedup();
                blocks
            };
            for block in &distinct {
                let refs = held.iter().filter(|event| event.block() == Some(*block)).count();
                let sample = held.iter().find(|event| event.block() == Some(*block)).unwrap();
                assert_eq!(pools.ref_count(sample), Some(refs as u8), "seed {seed}");
            }
            assert_eq!(pools.stats(1).used_blocks, distinct.len(), "seed {seed}");
        }

        held.into_iter().for_each(|event| pools.release(event));
        let stats = pools.stats(1);
        assert_eq!(stats.free_blocks, BLOCKS, "seed {seed}");
        assert!(stats.is_idle());
    }
}
