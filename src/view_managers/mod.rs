pub mod file_manager;
pub mod quiz_manager;
pub mod sidebar_manager;

pub(crate) use file_manager::FileManager;
pub(crate) use quiz_manager::QuizManager;
pub(crate) use sidebar_manager::SidebarManager;
