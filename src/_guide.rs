/*!

Tutorials, overviews, and etc... for the `mutatype` crate.

All the documentation that isn't API reference.

# Table of Contents

* [The `#[derive(Reflect)]` Macro][derive_macro]
* [Recursive Types and Constraints][recursive_types]
* [Integrating Your Mutator with a Fuzzer][fuzzer_integration]
* [Cargo Features][cargo_features]
* [Minimum Supported Rust Version][msrv]

 */

pub mod cargo_features;
pub mod derive_macro;
pub mod fuzzer_integration;
pub mod msrv;
pub mod recursive_types;
