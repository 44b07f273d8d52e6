mod conv_block;
mod gc_block;
mod logit;
mod shortcut;
mod squeezing_dense;
mod transpose_conv;
mod transpose_conv_block;
mod utils;

pub use conv_block::*;
pub use gc_block::*;
pub use logit::*;
pub use shortcut::*;
pub use squeezing_dense::*;
pub use transpose_conv::*;
pub use transpose_conv_block::*;
pub use utils::*;
