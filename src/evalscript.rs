//! The evalscript submitted with every process request, and the band layout
//! of the rasters it produces.
//!
//! The classification formulas are fixed business logic and run server-side;
//! nothing in this crate recomputes them.

/// Snow/masks evalscript. Two outputs: `spectral` (12 reflectance bands
/// scaled by 255) and `masks` (snow mask, usable snow mask and the source
/// quality bands).
pub const FINAL_DATA_REQUEST: &str = r#"
//VERSION=3

function setup() {
  return {
    input: ["B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B8A", "B09", "B11", "B12", "SCL", "SNW", "CLD", "CLP", "CLM", "dataMask"],
    output: [
        {id: "spectral", bands: 12, sampleType: "UINT8" },
        {id: "masks", bands: 7, sampleType: "UINT8" }
    ]
  };
}

/**
 * Uses NDSI and NDVI to create a mask for snow (1) or not snow (0).
 */
function snow_mask(sample) {
    var NDSI = (sample.B03 - sample.B11) / (sample.B03 + sample.B11);
    var NDVI = (sample.B08 - sample.B04) / (sample.B08 + sample.B04);
        function si(a) {
            // a = NDSI
            // if NDSI >= 0.4 then YES
            // else if NDVI in [0.075, 0.125] then YES
            // else NO
            return (a>=0.4) ? 1 : (Math.abs(NDVI - 0.1) <= 0.025 ? 1 : 0);
        }

        function br(a) {
            //  a = GREEN band
            // if GREEN > 0.3 then YES
            // else NO
            return a>0.3;
        }
    return si(NDSI) && br(sample.B03);
}

/**
 * Uses cloud probability (CLD) and NDVI to create a mask for whether a
 * pixel is usable and should be included in the snow calculations (1) or not (0).
 */
function usable_snow_mask(sample) {
    var NDVI = (sample.B08 - sample.B04) / (sample.B08 + sample.B04);
    return sample.CLD < 50.0 && NDVI <= 0.0
}

function evaluatePixel(sample) {
  return {
    spectral: [255*sample.B01, 255*sample.B02, 255*sample.B03, 255*sample.B04, 255*sample.B05, 255*sample.B06,
        255*sample.B07, 255*sample.B08, 255*sample.B8A, 255*sample.B09, 255*sample.B11, 255*sample.B12],
    masks: [snow_mask(sample), usable_snow_mask(sample),
        sample.SCL, sample.SNW, sample.CLD, sample.CLM, sample.dataMask]
    };
}
"#;

/// Band order of the `masks` output.
pub const MASK_BANDS: [&str; 7] = [
    "snow_mask",
    "usable_snow_mask",
    "SCL",
    "SNW",
    "CLD",
    "CLM",
    "dataMask",
];

/// Band order of the `spectral` output.
pub const SPECTRAL_BANDS: [&str; 12] = [
    "B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B8A", "B09", "B11", "B12",
];

/// 1-based position of the snow mask in the `masks` output.
pub const SNOW_BAND_POSITION: isize = 1;

/// 1-based position of the usable snow mask in the `masks` output.
pub const USABLE_BAND_POSITION: isize = 2;

/// 1-based position of the cloud mask (CLM) in the `masks` output.
pub const CLOUD_MASK_POSITION: isize = 6;

// -- Tests -------------------------------------------------------------------
