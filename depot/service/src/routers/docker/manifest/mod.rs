pub mod check_exists;
pub mod delete_image;
pub mod get_image;
pub mod put_image;
