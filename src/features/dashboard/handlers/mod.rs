pub mod dashboard_handler;

pub use dashboard_handler::{
    __path_list_admin_files, admin_dashboard_page, index, list_admin_files, user_dashboard_page,
};
