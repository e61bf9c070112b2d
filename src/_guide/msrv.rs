// XXX: Keep this documented MSRV in sync with the `rust-version` in
// `Cargo.toml`.

/*!

# Minimum Supported Rust Version

`mutatype` builds with Rust **1.80.0** and newer.

A raise of the MSRV only ever ships in a minor release.

One visible consequence of the current MSRV: a [`MutatorRef`][crate::MutatorRef]
cannot be upcast to `Arc<dyn Mutate>`, so functions that accept any mutator,
such as [`Session::init`][crate::Session::init], take `&(impl Mutate + ?Sized)`
and are happy with either a `&MutatorRef` or a `&dyn Mutator`.

 */
