pub(crate) mod rotate;
pub(crate) mod supercell;
pub(crate) mod nearest_image;
pub(crate) mod neighbors;
