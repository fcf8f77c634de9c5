pub mod coordinator;
pub mod error;

pub mod execution {
    pub mod executor;
    pub mod factory;
}

mod tests {
    mod coordinator;
}
