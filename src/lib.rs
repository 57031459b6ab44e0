pub mod account;
pub mod cli;
pub mod cmd;
pub mod conffile;
pub mod layout;
pub mod lifecycle;
pub mod paths;
pub mod preflight;
pub mod prompt;
pub mod settings;
pub mod systemd;
pub mod venv;

#[cfg(test)]
pub(crate) mod testing;
