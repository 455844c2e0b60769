pub mod browser;
pub mod client;
pub mod clock;
pub mod command;
pub mod error;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod run;
pub mod settings;
pub mod store;

#[cfg(test)]
mod test_support;
