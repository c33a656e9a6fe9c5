//! Loader symbol mangling.

use sha2::{Digest, Sha256};

use crate::consts::{HASH_PREFIX_LEN, SYMBOL_PREFIX};

/// Returns the globally unique loader symbol of module `module` exported
/// from package `package`.
///
/// The symbol is `zz_` followed by the first 160 bits of
/// `SHA-256("<package>/<module>")` as lowercase hex. The compiled bytecode
/// object is registered under this name in the executable's loader table,
/// so it must be stable across runs and machines.
pub fn mangle(package: &str, module: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(package.as_bytes());
  hasher.update(b"/");
  hasher.update(module.as_bytes());
  let full = format!("{:x}", hasher.finalize());
  format!("{}{}", SYMBOL_PREFIX, &full[..HASH_PREFIX_LEN])
}
