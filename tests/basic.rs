use rgb::RGB8;
use zenkd::{
    ColorTransform, GammaCurve, GammaTables, KColor, KdConfig, KdError, KdTreeBuilder,
    build_from_palette,
};

fn brute_closest(colors: &[KColor], k: KColor, skip: Option<usize>) -> usize {
    (0..colors.len())
        .filter(|&i| Some(i) != skip)
        .min_by_key(|&i| k.distance(colors[i]))
        .unwrap()
}

#[test]
fn black_white_red_scenario() {
    let palette = [
        RGB8::new(0, 0, 0),
        RGB8::new(255, 255, 255),
        RGB8::new(255, 0, 0),
    ];
    let mut tree = build_from_palette(&palette, &KdConfig::default()).unwrap();
    assert_eq!(tree.closest_8bit(10, 10, 10), Some(0));

    tree.disable(0).unwrap();
    let q = tree.transformed(10, 10, 10);
    let expected = brute_closest(tree.colors(), q, Some(0));
    assert_eq!(tree.closest_8bit(10, 10, 10), Some(expected));
    assert!(expected == 1 || expected == 2);

    tree.enable_all();
    assert_eq!(tree.closest_8bit(10, 10, 10), Some(0));
}

#[test]
fn single_color_palette() {
    let mut tree = build_from_palette(&[RGB8::new(12, 200, 77)], &KdConfig::default()).unwrap();
    for &(r, g, b) in &[(0, 0, 0), (255, 255, 255), (12, 200, 77), (90, 1, 250)] {
        assert_eq!(tree.closest_8bit(r, g, b), Some(0));
    }
    tree.build_xradius();
    assert_eq!(tree.xradius().unwrap(), &[u32::MAX]);
    assert_eq!(tree.max_depth(), 1);
}

#[test]
fn empty_palette() {
    let mut tree = build_from_palette(&[], &KdConfig::default()).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.closest_8bit(1, 2, 3), None);
    tree.build_xradius();
    assert_eq!(tree.xradius().unwrap().len(), 0);
    assert!(matches!(
        tree.disable(0),
        Err(KdError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn duplicate_palette_entries() {
    // Excluding one copy of a duplicated color leaves the other reachable.
    let palette = [
        RGB8::new(50, 60, 70),
        RGB8::new(200, 10, 10),
        RGB8::new(50, 60, 70),
    ];
    let mut tree = build_from_palette(&palette, &KdConfig::default()).unwrap();
    let first = tree.closest_8bit(50, 60, 70).unwrap();
    assert!(first == 0 || first == 2);

    tree.disable(first).unwrap();
    let other = tree.closest_8bit(50, 60, 70).unwrap();
    assert_eq!(other, 2 - first);

    tree.enable_all();
    tree.build_xradius();
    let xr = tree.xradius().unwrap();
    assert_eq!(xr[0], 0);
    assert_eq!(xr[2], 0);
    assert!(xr[1] > 0);
}

#[test]
fn insert_returns_stable_indexes() {
    let mut b = KdTreeBuilder::new(KdConfig::default()).unwrap();
    assert_eq!(b.insert_8bit(0, 0, 0).unwrap(), 0);
    assert_eq!(b.insert_rgb(RGB8::new(9, 9, 9)).unwrap(), 1);
    assert_eq!(b.insert_transformed(KColor::new(100, 100, 100)).unwrap(), 2);
    assert_eq!(b.len(), 3);

    let tree = b.build();
    assert_eq!(tree.color(2), Some(KColor::new(100, 100, 100)));
    assert_eq!(tree.color(3), None);

    let mut b = tree.into_builder();
    for i in 3..300 {
        let v = (i % 256) as u8;
        assert_eq!(b.insert_8bit(v, 255 - v, v / 2).unwrap(), i);
    }
    let tree = b.build();
    assert_eq!(tree.len(), 300);
    assert_eq!(tree.color(2), Some(KColor::new(100, 100, 100)));
}

#[test]
fn grayscale_index() {
    let config = KdConfig::default().transform(ColorTransform::Luminance);
    let grays: Vec<RGB8> = (0..=8u32)
        .map(|i| {
            let v = (i * 255 / 8) as u8;
            RGB8::new(v, v, v)
        })
        .collect();
    let tree = build_from_palette(&grays, &config).unwrap();

    // A color and a gray of the same luminance land on the same entry.
    let k = tree.transformed(200, 40, 90);
    let l = tree.gamma().encode(200, 40, 90).luminance();
    assert_eq!(k, KColor::new(l, l, l));
    assert_eq!(tree.closest(k), Some(brute_closest(tree.colors(), k, None)));
}

#[test]
fn power_gamma_index() {
    let config = KdConfig::default().gamma(GammaCurve::Power(2.2));
    let palette = [RGB8::new(0, 0, 0), RGB8::new(128, 128, 128)];
    let tree = build_from_palette(&palette, &config).unwrap();
    assert_eq!(tree.gamma().curve(), GammaCurve::Power(2.2));
    assert_ne!(tree.gamma(), GammaTables::srgb());
    assert_eq!(tree.closest_8bit(100, 100, 100), Some(1));
    assert_eq!(tree.closest_8bit(20, 20, 20), Some(0));
}

#[test]
fn repeated_queries_are_deterministic() {
    let palette: Vec<RGB8> = (0..64u32)
        .map(|i| RGB8::new((i * 37 % 256) as u8, (i * 91 % 256) as u8, (i * 13 % 256) as u8))
        .collect();
    let tree = build_from_palette(&palette, &KdConfig::default()).unwrap();
    for v in (0..=255u8).step_by(5) {
        let first = tree.closest_8bit(v, 255 - v, v / 3);
        for _ in 0..4 {
            assert_eq!(tree.closest_8bit(v, 255 - v, v / 3), first);
        }
    }
}
