use boxwright_lib::util::paths::{cache_dir, data_dir, plans_dir, shell_override};

use crate::output::print_stat;

pub fn cmd_info() {
  println!("boxwright {}", env!("CARGO_PKG_VERSION"));
  print_stat("Platform", &format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS));
  print_stat("Data", &data_dir().display().to_string());
  print_stat("Plans", &plans_dir().display().to_string());
  print_stat("Cache", &cache_dir().display().to_string());
  print_stat("Shell", shell_override().as_deref().unwrap_or("/bin/sh"));
}
