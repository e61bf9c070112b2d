/*!

# Integrating Your Mutator with a Fuzzer

Fuzzing engines such as `libfuzzer` only know about byte buffers. Every
`mutatype` mutator can read and write its values as bytes, so integrating with
an engine's custom-mutator hook takes three steps:

1. Decode the engine's bytes into a value with
   [`codec::from_bytes`][crate::codec::from_bytes] (or
   [`TypedMutator::from_bytes`][crate::TypedMutator::from_bytes]).

   The engine's corpus may contain buffers that are not valid encodings, for
   example when it starts from an empty corpus or splices two inputs together.
   In that case, create a fresh value with `init` instead.

2. Mutate the value.

3. Encode the mutated value with [`codec::to_bytes`][crate::codec::to_bytes]
   and copy it into the engine's buffer, falling back to the engine's own
   mutations when it does not fit.

The whole-buffer encoding drops the last length prefix where it can, so a
target that only wants, say, a string gets exactly the string's UTF-8 bytes.

## Example: `libfuzzer`

While `mutatype` is agnostic of which fuzzing engine you use, here's an
example of using `mutatype` to define a custom mutator for
[`libfuzzer-sys`][libfuzzer]. Integrating with other fuzzing engines' APIs
should look pretty similar.

Mutators are built once per process and shared between calls through a
`OnceLock`; building one walks the whole type description, so it should not
happen once per input.

```rust,no_run
#[cfg(feature = "derive")]
# mod example {
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use mutatype::{Factory, Reflect, Session, TypedMutator};
use std::sync::OnceLock;

/// A request to a key-value store.
#[derive(Debug, Reflect)]
pub enum Request {
    Get { key: String },
    Put {
        key: String,
        #[mutatype(with_length(min = 0, max = 64))]
        value: Vec<i8>,
    },
    Delete { key: String },
}

fn mutator() -> &'static TypedMutator<Vec<Request>> {
    static MUTATOR: OnceLock<TypedMutator<Vec<Request>>> = OnceLock::new();
    MUTATOR.get_or_init(|| {
        Factory::new()
            .typed::<Vec<Request>>()
            .expect("`Vec<Request>` is a supported type")
    })
}

fn run(requests: &[Request]) {
    // Apply the requests to the store under test...
#   let _ = requests;
}

// The fuzz target: decode the requests and run them.
fuzz_target!(|data: &[u8]| {
    if let Ok(requests) = mutator().from_bytes(data) {
        run(&requests);
    }
});

// The custom mutator: decode the requests, mutate them, and encode them back
// into the fuzzer's buffer.
fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    let mutator = mutator();

    // Configure the mutation with the seed that libfuzzer gave us.
    let mut session = Session::new().seed(seed.into());

    let mutated = match mutator.from_bytes(&data[..size]) {
        Ok(requests) => mutator.mutate(&requests, session.context()),
        // Not one of ours: start over from a fresh value.
        Err(_) => mutator.init(session.context()),
    };

    let bytes = match mutated.and_then(|requests| mutator.to_bytes(&requests)) {
        Ok(bytes) if bytes.len() <= max_size => bytes,
        // If we failed to mutate the test case, or the result is too big, fall
        // back to the fuzzer's default mutation strategies.
        _ => return fuzzer_mutate(data, size, max_size),
    };

    data[..bytes.len()].copy_from_slice(&bytes);
    bytes.len()
});
# }
```

[libfuzzer]: https://crates.io/crates/libfuzzer-sys

 */
