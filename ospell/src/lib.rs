/*! Spell-checking and correction with Finite-State Automata.

Implements spell-checking and correction using weighted finite-state
automata in the HFST optimized-lookup format. The automata can be compiled
using [`HFST`], or assembled in memory with
[`TransducerBuilder`](transducer::hfst::builder::TransducerBuilder).

[`HFST`]: https://hfst.github.io

# Usage examples

```no_run
use std::sync::Arc;
use ospell::speller::{HfstSpeller, Speller};

let speller: Arc<HfstSpeller> =
    HfstSpeller::from_paths("uz.acceptor.hfst", "uz.errmodel.hfst", None).unwrap();

if !speller.clone().spell("nma") {
    for suggestion in speller.suggest("nma") {
        println!("{}\t{}", suggestion.value(), suggestion.weight());
    }
}
```

A `.zhfst` archive bundles both models with their metadata:

```no_run
use ospell::archive::{SpellerArchive, ZipSpellerArchive};
use ospell::speller::Speller;

let archive = ZipSpellerArchive::open("uz.zhfst").unwrap();
let suggestions = archive.speller().suggest("qalesan");
```
*/

pub mod archive;
pub mod constants;
pub mod lookup;
pub mod speller;
pub mod tokenizer;
pub mod transducer;
pub mod types;
pub mod vfs;

use std::path::Path;

pub use crate::lookup::lookup;
use crate::transducer::{HfstTransducer, TransducerError};

/// Load a transducer from an optimized-lookup file.
pub fn create_transducer<P: AsRef<Path>>(path: P) -> Result<HfstTransducer, TransducerError> {
    crate::transducer::hfst::load(path)
}

/// Log to stderr, filtered by `RUST_LOG`.
#[cfg(feature = "logging")]
pub fn enable_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
