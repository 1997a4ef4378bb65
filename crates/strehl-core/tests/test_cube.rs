mod common;

use ndarray::{Array2, Array3, Axis};

use strehl_core::cube::{
    average_to_exposure, flat_field, median_frame, parse_ranges, remove_band_cube, split_frames,
    sum_ranges,
};
use strehl_core::error::StrehlError;

use common::{add_column_bias, numbered_cube};

#[test]
fn test_sum_ranges_per_range() {
    let cube = numbered_cube(6, 2, 3);
    let ranges = parse_ranges("1-3, 5-6").unwrap();
    let sums = sum_ranges(&cube.view(), &ranges).unwrap();
    assert_eq!(sums.len(), 2);
    assert!(sums[0].iter().all(|&v| v == 6.0));
    assert!(sums[1].iter().all(|&v| v == 11.0));

    let err = sum_ranges(&cube.view(), &[(5, 7)]).unwrap_err();
    assert!(matches!(
        err,
        StrehlError::FrameIndexOutOfRange { index: 7, total: 6 }
    ));
}

#[test]
fn test_split_frames_keeps_indices() {
    let cube = numbered_cube(5, 2, 2);
    let frames = split_frames(&cube.view(), &parse_ranges("2-3,5").unwrap()).unwrap();
    let indices: Vec<usize> = frames.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![2, 3, 5]);
    assert!(frames[2].1.iter().all(|&v| v == 5.0));
}

#[test]
fn test_median_frame_ignores_outliers() {
    let mut cube = numbered_cube(5, 3, 3);
    cube[[4, 1, 1]] = 1e6;
    let med = median_frame(&cube.view()).unwrap();
    assert!(med.iter().all(|&v| v == 3.0));

    let even = numbered_cube(4, 1, 1);
    assert_eq!(median_frame(&even.view()).unwrap()[[0, 0]], 2.5);

    let empty = Array3::<f64>::zeros((0, 2, 2));
    assert!(matches!(
        median_frame(&empty.view()),
        Err(StrehlError::EmptySequence)
    ));
}

#[test]
fn test_flat_field_divides_each_frame() {
    let cube = numbered_cube(3, 2, 2);
    let flat = Array2::from_elem((2, 2), 2.0);
    let out = flat_field(&cube.view(), &flat).unwrap();
    assert_eq!(out[[2, 1, 1]], 1.5);

    let wrong = Array2::from_elem((3, 2), 1.0);
    assert!(matches!(
        flat_field(&cube.view(), &wrong),
        Err(StrehlError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_average_to_exposure_groups_and_drops_leftovers() {
    let cube = numbered_cube(7, 2, 2);
    let out = average_to_exposure(&cube.view(), 1.0, 3.0, 1, None).unwrap();
    assert_eq!(out.len_of(Axis(0)), 2);
    // 1+2+3 and 4+5+6; frame 7 is left over
    assert_eq!(out[[0, 0, 0]], 6.0);
    assert_eq!(out[[1, 1, 1]], 15.0);
}

#[test]
fn test_average_to_exposure_sub_range() {
    let cube = numbered_cube(10, 1, 1);
    let out = average_to_exposure(&cube.view(), 0.5, 1.0, 3, Some(8)).unwrap();
    let sums: Vec<f64> = out.iter().copied().collect();
    assert_eq!(sums, vec![7.0, 11.0, 15.0]);
}

#[test]
fn test_average_to_exposure_rounds_ratio_down() {
    let cube = numbered_cube(6, 1, 1);
    let out = average_to_exposure(&cube.view(), 1.0, 2.5, 1, None).unwrap();
    assert_eq!(out.len_of(Axis(0)), 3);
    assert_eq!(out[[2, 0, 0]], 11.0);
}

#[test]
fn test_average_to_exposure_errors() {
    let cube = numbered_cube(4, 1, 1);
    let view = cube.view();
    assert!(matches!(
        average_to_exposure(&view, 2.0, 1.0, 1, None),
        Err(StrehlError::Exposure(_))
    ));
    assert!(matches!(
        average_to_exposure(&view, 1.0, 1.5, 1, None),
        Err(StrehlError::Exposure(_))
    ));
    assert!(matches!(
        average_to_exposure(&view, 1.0, 2.0, 1, Some(9)),
        Err(StrehlError::FrameIndexOutOfRange { index: 9, total: 4 })
    ));
    assert!(matches!(
        average_to_exposure(&view, 1.0, 2.0, 4, Some(3)),
        Err(StrehlError::InvalidRange(_))
    ));
    assert!(matches!(
        average_to_exposure(&view, 1.0, 4.0, 2, None),
        Err(StrehlError::Exposure(_))
    ));

    let single = numbered_cube(1, 1, 1);
    assert!(matches!(
        average_to_exposure(&single.view(), 1.0, 2.0, 1, None),
        Err(StrehlError::Exposure(_))
    ));
}

#[test]
fn test_remove_band_cube_flattens_each_frame() {
    let mut cube = Array3::<f64>::zeros((2, 10, 6));
    for (i, mut plane) in cube.axis_iter_mut(Axis(0)).enumerate() {
        let mut frame = plane.to_owned();
        add_column_bias(&mut frame, 10.0 * i as f64, 1.0);
        plane.assign(&frame);
    }
    cube[[1, 5, 3]] += 50.0;

    let out = remove_band_cube(&cube.view(), 4, 7).unwrap();
    assert!(out
        .index_axis(Axis(0), 0)
        .iter()
        .all(|v| v.abs() < 1e-12));
    let second = out.index_axis(Axis(0), 1);
    assert!((second[[5, 3]] - 50.0).abs() < 1e-12);
    assert!(second[[0, 3]].abs() < 1e-12);

    assert!(matches!(
        remove_band_cube(&cube.view(), 0, 10),
        Err(StrehlError::InvalidBand { .. })
    ));
}
