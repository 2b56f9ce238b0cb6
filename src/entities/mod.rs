// Entity Models - Book + User
// Identity is the store-assigned `id`; every other field is a value.

pub mod book;
pub mod user;

pub use book::Book;
pub use user::User;
