pub mod auth;
pub mod todo;
pub mod user;

#[cfg(test)]
pub(crate) mod test_util;
