use std::io::Write;

use approx::assert_relative_eq;
use ndarray::{Array2, Array3};

use strehl_core::error::StrehlError;
use strehl_core::io::fits::{read_frame, write_fits, FitsImage};
use strehl_core::io::image_io::{indexed_files, load_image, load_image_stack};
use strehl_core::io::table::write_strehl_series;

// ---------------------------------------------------------------------------
// FITS
// ---------------------------------------------------------------------------

/// One 2880-byte header block; each card padded to 80 bytes.
fn header_block(cards: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for c in cards {
        let mut card = c.as_bytes().to_vec();
        card.resize(80, b' ');
        out.extend_from_slice(&card);
    }
    out.resize(2880, b' ');
    out
}

/// Hand-built 16-bit FITS frame, 3 columns by 2 rows, with `extra` cards
/// ahead of END.
fn int16_fits(values: &[i16], bzero: f64, extra: &[&str]) -> Vec<u8> {
    let mut cards = vec![
        "SIMPLE  =                    T".to_string(),
        "BITPIX  =                   16".to_string(),
        "NAXIS   =                    2".to_string(),
        "NAXIS1  =                    3 / columns".to_string(),
        "NAXIS2  =                    2".to_string(),
        format!("BZERO   = {bzero:>20}"),
        "EXPTIME =                 0.25".to_string(),
    ];
    cards.extend(extra.iter().map(|c| c.to_string()));
    cards.push("END".to_string());

    let mut out = header_block(&cards);
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.resize(2 * 2880, 0);
    out
}

#[test]
fn test_fits_cube_roundtrip_keeps_exposure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.fits");
    let cube = Array3::from_shape_fn((3, 4, 5), |(f, r, c)| (f * 100 + r * 10 + c) as f64 + 0.5);

    write_fits(&path, &cube.view().into_dyn(), Some(0.02)).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len() % 2880, 0);

    let img = FitsImage::open(&path).unwrap();
    assert!(img.is_cube());
    assert_eq!(img.frame_count(), 3);
    assert_relative_eq!(img.exposure.unwrap(), 0.02, max_relative = 1e-6);
    assert_eq!(img.cube().unwrap(), cube.view());
    assert_eq!(img.plane(2).unwrap()[[3, 4]], 234.5);
    assert!(matches!(
        img.plane(3),
        Err(StrehlError::FrameIndexOutOfRange { index: 3, total: 3 })
    ));
}

#[test]
fn test_fits_int16_with_bzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");
    std::fs::write(&path, int16_fits(&[-32768, 0, 1, 2, 3, 32767], 32768.0, &[])).unwrap();

    let img = FitsImage::open(&path).unwrap();
    assert_eq!(img.exposure, Some(0.25));
    let data = img.into_frame_data().unwrap();
    assert_eq!(data.dim(), (2, 3));
    assert_eq!(data[[0, 0]], 0.0);
    assert_eq!(data[[0, 2]], 32769.0);
    assert_eq!(data[[1, 2]], 65535.0);
}

#[test]
fn test_fits_multibyte_header_card_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accent.fits");
    // the two-byte character straddles the end of the keyword field
    let bytes = int16_fits(&[1, 2, 3, 4, 5, 6], 0.0, &["ABCDEFG\u{e9}= 1"]);
    assert_eq!(bytes.len(), 2 * 2880);
    std::fs::write(&path, bytes).unwrap();

    match FitsImage::open(&path) {
        Ok(img) => assert_eq!(img.into_frame_data().unwrap()[[1, 2]], 6.0),
        Err(e) => assert!(
            matches!(e, StrehlError::InvalidFits(_) | StrehlError::Fits(_)),
            "unexpected error {e}"
        ),
    }
}

#[test]
fn test_write_fits_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");
    write_fits(&path, &Array2::<f64>::ones((4, 4)).view().into_dyn(), Some(1.0)).unwrap();
    let frame = Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c) as f64);
    write_fits(&path, &frame.view().into_dyn(), None).unwrap();

    let img = FitsImage::open(&path).unwrap();
    assert_eq!(img.exposure, None);
    assert_eq!(img.into_frame_data().unwrap(), frame);
}

#[test]
fn test_missing_fits_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        FitsImage::open(&dir.path().join("absent.fits")),
        Err(StrehlError::Io(_))
    ));
}

#[test]
fn test_read_frame_rejects_cube() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.fits");
    write_fits(&path, &Array3::<f64>::zeros((2, 3, 3)).view().into_dyn(), None).unwrap();
    assert!(matches!(
        read_frame(&path),
        Err(StrehlError::Dimensionality { ndim: 3 })
    ));
}

#[test]
fn test_non_fits_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.fits");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&[b'x'; 2880]).unwrap();
    drop(f);
    assert!(matches!(
        FitsImage::open(&path),
        Err(StrehlError::InvalidFits(_))
    ));
}

// ---------------------------------------------------------------------------
// Raster images
// ---------------------------------------------------------------------------

fn write_gray16(path: &std::path::Path, w: u32, h: u32, f: impl Fn(u32, u32) -> u16) {
    let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_fn(w, h, |x, y| {
        image::Luma([f(x, y)])
    });
    img.save(path).unwrap();
}

#[test]
fn test_png_keeps_raw_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    write_gray16(&path, 4, 3, |x, y| (y * 1000 + x) as u16);

    let data = load_image(&path).unwrap();
    assert_eq!(data.dim(), (3, 4));
    assert_eq!(data[[2, 3]], 2003.0);
}

#[test]
fn test_indexed_files_sort_numerically() {
    let dir = tempfile::tempdir().unwrap();
    for i in [10, 2, 1] {
        write_gray16(&dir.path().join(format!("img{i}.png")), 2, 2, |_, _| i);
    }
    std::fs::write(dir.path().join("imgX.png"), b"").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

    let files = indexed_files(dir.path(), "img$i.png").unwrap();
    let indices: Vec<usize> = files.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![1, 2, 10]);

    let paths: Vec<_> = files.into_iter().map(|(_, p)| p).collect();
    let cube = load_image_stack(&paths).unwrap();
    assert_eq!(cube.dim(), (3, 2, 2));
    assert_eq!(cube[[2, 0, 0]], 10.0);
}

#[test]
fn test_pattern_needs_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        indexed_files(dir.path(), "img.png"),
        Err(StrehlError::InvalidPattern(_))
    ));
}

#[test]
fn test_stack_rejects_mixed_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    write_gray16(&a, 4, 4, |_, _| 1);
    write_gray16(&b, 4, 3, |_, _| 1);
    assert!(matches!(
        load_image_stack(&[a, b]),
        Err(StrehlError::ShapeMismatch { .. })
    ));
    let none: [&str; 0] = [];
    assert!(matches!(
        load_image_stack(&none),
        Err(StrehlError::EmptySequence)
    ));
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[test]
fn test_series_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("series.dat");
    write_strehl_series(&path, &[1, 2], &[(1, vec![0.5, 0.25]), (2, vec![1.0, 0.75])]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("# columns 2 and up"));
    assert_eq!(lines[1], "frameidx\t1\t2");
    assert_eq!(lines[2], "1\t0.5\t0.25");
    assert_eq!(lines[3], "2\t1\t0.75");
}

#[test]
fn test_series_row_width_checked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("series.dat");
    let err = write_strehl_series(&path, &[1, 2, 3], &[(1, vec![0.5])]).unwrap_err();
    assert!(matches!(err, StrehlError::RadiusMismatch { frame: 1, psf: 3 }));
}

#[test]
fn test_frame_array_shape_is_rows_by_cols() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.fits");
    let data = Array2::from_shape_fn((2, 7), |(r, c)| (r * 7 + c) as f64);
    write_fits(&path, &data.view().into_dyn(), None).unwrap();
    assert_eq!(read_frame(&path).unwrap(), data);
}
