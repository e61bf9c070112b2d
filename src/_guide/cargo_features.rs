/*!

# Cargo Features

* **`derive`** (enabled by default): Enable the `#[derive(Reflect)]` macro for
  automatically describing your types to the mutator factory.

* **`log`** (enabled by default): Enable logging with [the `log`
  crate](https://docs.rs/log). The factory logs each mutator it builds at
  `trace` level, rolled-back builds at `warn` level, and mutations that could
  not change their value at `debug` level.

* **`check`**: Enable the `mutatype::check` module for writing smoke tests of
  properties and of the mutator contract.

 */
