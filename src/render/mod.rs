/// `vello_cpu` backed surfaces.
pub mod cpu;
/// Canvas covers cut away by progress.
pub mod reveal;
/// Drawing surface trait and a recording surface.
pub mod surface;
