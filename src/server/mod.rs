// HTTP front: JSON routes over the read façade.

pub mod handler;
