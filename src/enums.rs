#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PicType {
    I = 1,
    P = 2,
    B = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MbPartType {
    Mb16x16 = 0,
    Mb16x8 = 1,
    Mb8x16 = 2,
    Mb8x8 = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntraLumaMode {
    Vertical = 0,
    Horizontal = 1,
    Dc = 2,
    DownLeft = 3,
    DownRight = 4,
}
