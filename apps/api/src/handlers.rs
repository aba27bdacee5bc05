pub mod bundles;
pub mod catalog;
pub mod health;

#[cfg(test)]
mod tests;
