// Dequantisation, scan and weight-quantisation tables (GY/T 257.1-2012 tables 61/62).

pub const DEQUANT_SCALE: [i32; 64] = [
    32768, 36061, 38968, 42495, 46341, 50535, 55437, 60424,
    32932, 35734, 38968, 42495, 46177, 50535, 55109, 59933,
    65535, 35734, 38968, 42577, 46341, 50617, 55027, 60097,
    32809, 35734, 38968, 42454, 46382, 50576, 55109, 60056,
    65535, 35734, 38968, 42495, 46320, 50515, 55109, 60076,
    65535, 35744, 38968, 42495, 46341, 50535, 55099, 60087,
    65535, 35734, 38973, 42500, 46341, 50535, 55109, 60097,
    32771, 35734, 38965, 42497, 46341, 50535, 55109, 60099,
];

pub const DEQUANT_SHIFT: [u8; 64] = [
    14, 14, 14, 14, 14, 14, 14, 14,
    13, 13, 13, 13, 13, 13, 13, 13,
    13, 12, 12, 12, 12, 12, 12, 12,
    11, 11, 11, 11, 11, 11, 11, 11,
    11, 10, 10, 10, 10, 10, 10, 10,
    10,  9,  9,  9,  9,  9,  9,  9,
     9,  8,  8,  8,  8,  8,  8,  8,
     7,  7,  7,  7,  7,  7,  7,  7,
];

pub const CHROMA_QP: [u8; 64 + 16] = [
    0,  1,  2,  3,  4,  5,  6,  7,  8,  9,  10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 42, 43, 43, 44, 44,
    45, 45, 46, 46, 47, 47, 48, 48, 48, 49, 49, 49, 50, 50, 50, 51,
];

/// Inverse scan order: index `k` in decode order maps to raster position
/// `INV_SCAN_FRAME[k]` in an 8x8 block. Two tables since frame- and
/// field-coded macroblocks use different zig-zag paths.
pub const INV_SCAN_FRAME: [u8; 64] = [
    0,  8,  1,  2,  9,  16, 24, 17, 10, 3,  4,  11, 18, 25, 32, 40,
    33, 26, 19, 12, 5,  6,  13, 20, 27, 34, 41, 48, 56, 49, 42, 35,
    28, 21, 14, 7,  15, 22, 29, 36, 43, 50, 57, 58, 51, 44, 37, 30,
    23, 31, 38, 45, 52, 59, 60, 53, 46, 39, 47, 54, 61, 62, 55, 63,
];

pub const INV_SCAN_FIELD: [u8; 64] = [
    0,  1,  2,  8,  3,  4,  9,  10, 5,  6,  11, 16, 17, 7,  12, 18,
    24, 13, 14, 19, 25, 26, 32, 15, 20, 33, 21, 27, 34, 22, 28, 35,
    40, 41, 23, 29, 36, 42, 48, 43, 30, 37, 49, 50, 44, 31, 38, 51,
    45, 39, 52, 46, 53, 47, 54, 56, 55, 57, 58, 59, 60, 61, 62, 63,
];

/// Base weighting-quantisation parameters, one row per `weight_quant_index`
/// (row 3 is reserved/unused by the broadcast profile).
pub const WQ_PARAM: [[u8; 8]; 4] = [
    [128, 98, 106, 116, 116, 128, 0, 0],
    [135, 143, 143, 160, 160, 213, 0, 0],
    [128, 98, 106, 116, 116, 128, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

macro_rules! wq_model_0 {
    ($wq:expr) => {
        [
            $wq[0], $wq[0], $wq[0], $wq[4], $wq[4], $wq[4], $wq[5], $wq[5],
            $wq[0], $wq[0], $wq[3], $wq[3], $wq[3], $wq[3], $wq[5], $wq[5],
            $wq[0], $wq[3], $wq[2], $wq[2], $wq[1], $wq[1], $wq[5], $wq[5],
            $wq[4], $wq[3], $wq[2], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5],
            $wq[4], $wq[3], $wq[1], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[4], $wq[3], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
        ]
    };
}

macro_rules! wq_model_1 {
    ($wq:expr) => {
        [
            $wq[0], $wq[0], $wq[0], $wq[4], $wq[4], $wq[4], $wq[5], $wq[5],
            $wq[0], $wq[0], $wq[4], $wq[4], $wq[4], $wq[4], $wq[5], $wq[5],
            $wq[0], $wq[3], $wq[2], $wq[2], $wq[2], $wq[1], $wq[5], $wq[5],
            $wq[3], $wq[3], $wq[2], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5],
            $wq[3], $wq[3], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[3], $wq[3], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
        ]
    };
}

macro_rules! wq_model_2 {
    ($wq:expr) => {
        [
            $wq[0], $wq[0], $wq[0], $wq[4], $wq[4], $wq[3], $wq[5], $wq[5],
            $wq[0], $wq[0], $wq[4], $wq[4], $wq[3], $wq[2], $wq[5], $wq[5],
            $wq[0], $wq[4], $wq[4], $wq[3], $wq[2], $wq[1], $wq[5], $wq[5],
            $wq[4], $wq[4], $wq[3], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5],
            $wq[4], $wq[3], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[3], $wq[2], $wq[1], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
            $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5], $wq[5],
        ]
    };
}

/// Expand a `weight_quant_index` row of [`WQ_PARAM`] into a full 8x8
/// weighting matrix (raster order) for the given `weight_quant_model` (0-2).
pub fn expand_weight_quant_matrix(model: u8, wq: &[u8; 8]) -> [u8; 64] {
    match model {
        0 => wq_model_0!(wq),
        1 => wq_model_1!(wq),
        _ => wq_model_2!(wq),
    }
}

/// Default (flat) weighting matrix used when `weight_quant_enable` is off.
pub const WQ_FLAT: [u8; 64] = [8; 64];
