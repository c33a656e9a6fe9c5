mod build;
mod checkout;
mod clean;
mod distclean;
mod get;
mod init;
mod install;
mod run;
mod test;

pub use build::cmd_build;
pub use checkout::cmd_checkout;
pub use clean::cmd_clean;
pub use distclean::cmd_distclean;
pub use get::cmd_get;
pub use init::cmd_init;
pub use install::cmd_install;
pub use run::cmd_run;
pub use test::cmd_test;

use std::rc::Rc;

use anyhow::Result;

use zz_lib::remote::PackageRef;
use zz_lib::{BuildContext, Engine};

/// The build context named on the command line, or the package containing
/// the current directory.
pub(crate) fn context_for(engine: &Rc<Engine>, package: Option<&str>) -> Result<Rc<BuildContext>> {
  match package {
    Some(spec) => {
      let package = PackageRef::parse(spec)?;
      Ok(engine.context(&package.id)?)
    }
    None => Ok(engine.current_context()?),
  }
}
