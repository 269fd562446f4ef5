use rand::Rng;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use allocated::AllocErrorWithLayout;
use allocated::CountingAllocator;

use allocated_rbtree::AllocatedRbTreeMap;

fn main() -> Result<(), AllocErrorWithLayout> {
    TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("logger is only initialised once");

    let mut rng = rand::thread_rng();

    for i in 0..100 {
        let alloc = CountingAllocator::default();
        let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

        for _ in 0..1000 {
            let k: u32 = rng.gen_range(0..2000);
            let v: u32 = rng.gen();

            if rng.gen_bool(0.25) {
                // Missing keys are expected here; only the counts matter.
                let _ = unsafe { tree.remove_in(&alloc, &k) };
            } else {
                unsafe {
                    tree.insert_in(&alloc, k, v)?;
                }
            }

            println!(
                "{},{},{},{},{}",
                i,
                tree.len(),
                alloc.n_allocations(),
                alloc.n_deallocations(),
                alloc.n_bytes_allocated()
            );
        }

        std::mem::drop(tree);

        assert_eq!(alloc.net_allocations(), 0);
        assert_eq!(alloc.net_bytes_allocated(), 0);
    }

    Ok(())
}
