pub mod line_vertex;
pub mod marker_instance;
pub mod marker_vertex;
