//! Shared constants.

/// Environment variable selecting the workspace root.
pub const WORKSPACE_ENV: &str = "WORKSPACE";

/// Workspace directory under `$HOME` when `WORKSPACE` is not set.
pub const DEFAULT_WORKSPACE_DIR: &str = "zz";

/// Environment variable overriding the core package identifier.
pub const CORE_PACKAGE_ENV: &str = "ZZ_CORE_PACKAGE";

/// The distinguished package implicitly imported by every other package.
/// It provides the runtime templates and the base modules.
pub const DEFAULT_CORE_PACKAGE: &str = "github.com/cellux/zz";

/// File name of the package descriptor.
pub const DESCRIPTOR_FILE: &str = "package.lua";

/// Module implicitly appended to every package's exports: the descriptor
/// itself is compiled into the package library.
pub const PACKAGE_MODULE: &str = "package";

/// Prefix of mangled loader symbols.
pub const SYMBOL_PREFIX: &str = "zz_";

/// Hex characters kept from the SHA-256 of `<package>/<module>` (160 bits).
pub const HASH_PREFIX_LEN: usize = 40;

/// Loader symbol of the compiled bootstrap script.
pub const MAIN_SYMBOL: &str = "_main";

/// Runtime loader template files, looked up in the core package's source
/// tree and treated as opaque payloads.
pub const MAIN_TPL_C: &str = "_main.tpl.c";
pub const MAIN_TPL_LUA: &str = "_main.tpl.lua";

/// Globals bound at the top of every generated bootstrap script.
pub const PACKAGE_GLOBAL: &str = "ZZ_PACKAGE";
pub const CORE_PACKAGE_GLOBAL: &str = "ZZ_CORE_PACKAGE";
