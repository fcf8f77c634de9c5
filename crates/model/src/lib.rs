pub mod core {
    pub mod labels;
    pub mod matcher;
    pub mod time_range;
}

pub mod records {
    pub mod series;
    pub mod slab;
}

pub mod execution {
    pub mod checkpoint;
    pub mod job;
}
