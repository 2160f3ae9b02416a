pub mod argument_graph;
pub mod options_panel;
