/// 启动检查（上游地址、字体文件、访问口令）
pub mod checks;
/// 字体集合加载
pub mod font_loader;

pub use checks::run_startup_checks;
pub use font_loader::load_font_set;
