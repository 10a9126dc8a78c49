use molar_glass::prelude::*;
use std::f64::consts::PI;
use std::io::Write;
use tempfile::NamedTempFile;

type Config = (Vec<(&'static str, [f32; 3])>, f32);

fn write_xyz(configs: &[Config]) -> anyhow::Result<NamedTempFile> {
    let mut f = NamedTempFile::new()?;
    for (atoms, l) in configs {
        writeln!(f, "{}", atoms.len())?;
        writeln!(
            f,
            "Lattice=\"{l} 0.0 0.0 0.0 {l} 0.0 0.0 0.0 {l}\" Properties=species:S:1:pos:R:3"
        )?;
        for (el, p) in atoms {
            writeln!(f, "{el} {:.6} {:.6} {:.6}", p[0], p[1], p[2])?;
        }
    }
    Ok(f)
}

fn run(settings: Settings, file: &NamedTempFile) -> anyhow::Result<TrajectoryResults> {
    let frames = XyzFileHandler::open(&file.path().to_string_lossy())?;
    Ok(TrajectoryAnalyzer::new(settings)?
        .with_log_every(0)
        .run(frames, 4)?)
}

// 5x5x5 simple cubic lattice with spacing 2
fn cubic_lattice() -> Config {
    let mut atoms = vec![];
    for i in 0..5 {
        for j in 0..5 {
            for k in 0..5 {
                atoms.push(("Si", [2.0 * i as f32, 2.0 * j as f32, 2.0 * k as f32]));
            }
        }
    }
    (atoms, 10.0)
}

// Ideal beta-cristobalite, 2x2x2 unit cells with a = 7.16
fn cristobalite(shift: f32) -> Config {
    let a = 7.16f32;
    let fcc = [[0.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]];
    let arms = [[1.0, 1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]];
    let mut atoms = vec![];
    for cx in 0..2 {
        for cy in 0..2 {
            for cz in 0..2 {
                let c = [cx as f32, cy as f32, cz as f32];
                let at = |f: &[f32; 3], d: [f32; 3]| -> [f32; 3] {
                    [
                        (f[0] + c[0] + d[0]) * a + shift,
                        (f[1] + c[1] + d[1]) * a,
                        (f[2] + c[2] + d[2]) * a,
                    ]
                };
                for f in &fcc {
                    atoms.push(("Si", at(f, [0.0; 3])));
                    atoms.push(("Si", at(f, [0.25; 3])));
                    for v in &arms {
                        atoms.push(("O", at(f, [v[0] / 8.0, v[1] / 8.0, v[2] / 8.0])));
                    }
                }
            }
        }
    }
    (atoms, 2.0 * a)
}

#[test]
fn cubic_lattice_pair_distribution() -> anyhow::Result<()> {
    let mut s = Settings::sio2();
    s.cutoffs = vec![CutoffEntry::new("Si", "Si", 2.1)];
    s.properties.structural_units = false;
    s.pair_distribution.r_max = 3.0;
    s.pair_distribution.n_bins = 30;
    s.pair_distribution.pairs = vec![ElementPair::new("Si", "Si")];
    s.bond_angles.triplets = vec![ElementTriplet::new("Si", "Si", "Si")];

    let f = write_xyz(&[cubic_lattice()])?;
    let res = run(s, &f)?;
    let c = &res.pair_curves[0];

    // Integral of g(r) recovers 6 first and 12 second neighbours
    let (n, v) = (125.0, 1000.0);
    let dr = 0.1;
    let integral: f64 = c
        .r
        .iter()
        .zip(c.g.iter())
        .map(|(r, g)| g * 4.0 * PI * r * r * dr * (n - 1.0) / v)
        .sum();
    assert!((integral - 18.0).abs() < 1e-6);
    assert_eq!(c.n_bonds, 375);
    assert!((c.bond_length.0 - 2.0).abs() < 1e-6);

    // 12 right and 3 straight angles around each atom
    let a = &res.angle_curves[0];
    assert_eq!(a.n_angles, 125 * 15);
    assert!((a.angle.0 - 108.0).abs() < 1e-4);
    assert!(res.shapes.is_none());
    Ok(())
}

#[test]
fn cristobalite_network() -> anyhow::Result<()> {
    let f = write_xyz(&[cristobalite(0.0), cristobalite(0.37)])?;
    let res = run(Settings::sio2(), &f)?;
    assert_eq!(res.n_frames(), 2);
    assert!(res.warnings.is_empty());

    let avg = |name: &str| res.average(name).map(|(m, _)| m).unwrap_or(f64::NAN);
    assert_eq!(avg("cn_Si"), 4.0);
    assert_eq!(avg("SiO4"), 1.0);
    assert_eq!(avg("cn_O"), 2.0);
    assert_eq!(avg("OSi2"), 1.0);
    assert_eq!(avg("Q4"), 1.0);
    assert_eq!(avg("corner"), 4.0);
    assert_eq!(avg("edge"), 0.0);
    assert_eq!(avg("face"), 0.0);
    assert_eq!(avg("corner_SiO4"), 4.0);
    assert_eq!(avg("tetrahedra"), 1.0);
    // 8 SiO2 units in 7.16^3
    assert!((avg("density") - 2.175).abs() < 0.01);

    let si_o_si = &res.angle_curves[0];
    assert_eq!(si_o_si.triplet.to_string(), "Si-O-Si");
    assert!((si_o_si.angle.0 - 180.0).abs() < 0.01);
    let o_si_o = &res.angle_curves[1];
    assert_eq!(o_si_o.n_angles, 2 * 64 * 6);
    assert!((o_si_o.angle.0 - 109.4712).abs() < 0.01);

    let si_o = &res.pair_curves[1];
    assert!((si_o.bond_length.0 - 1.55).abs() < 1e-3);

    let shapes = res.shapes.as_ref().unwrap();
    assert!(shapes.tetrahedra[0] > 0.999);
    Ok(())
}

#[test]
fn grid_and_brute_force_agree() -> anyhow::Result<()> {
    let mut conf = cristobalite(0.0);
    // Distort the network so that coordination varies
    for (k, (_, p)) in conf.0.iter_mut().enumerate() {
        let d = ((k * 7919) % 13) as f32 * 0.06 - 0.36;
        p[k % 3] += d;
    }
    let f = write_xyz(&[conf])?;

    let grid = run(Settings::sio2(), &f)?;
    let mut s = Settings::sio2();
    s.neighbor_search = SearchMethod::BruteForce;
    let brute = run(s, &f)?;

    assert_eq!(grid.averages, brute.averages);
    for (a, b) in grid.angle_curves.iter().zip(brute.angle_curves.iter()) {
        assert_eq!(a.density, b.density);
    }
    Ok(())
}

#[test]
fn minimum_image_across_boundary() -> anyhow::Result<()> {
    let f = write_xyz(&[(vec![("Si", [0.1, 5.0, 5.0]), ("O", [9.9, 5.0, 5.0])], 10.0)])?;
    let fr = XyzFileHandler::open(&f.path().to_string_lossy())?
        .read()?
        .unwrap();
    let table = Settings::sio2().cutoff_table()?;
    let g = NeighborFinder::new(&table).find(&fr)?.graph;
    assert_eq!(g.neighbors(0).len(), 1);
    assert!((g.neighbors(0)[0].distance - 0.2).abs() < 1e-5);
    Ok(())
}

#[test]
fn results_written() -> anyhow::Result<()> {
    let f = write_xyz(&[cristobalite(0.0)])?;
    let res = run(Settings::sio2(), &f)?;
    let dir = tempfile::tempdir()?;
    let files = ResultsWriter::new(dir.path())?.write_all(&res)?;

    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    for expected in [
        "pair_distribution-Si-O.dat",
        "average_bond_length.dat",
        "bond_angles-O-Si-O.dat",
        "average_bond_angle.dat",
        "structural_units.dat",
        "structural_units_average.dat",
        "polyhedricity.dat",
    ] {
        assert!(names.iter().any(|n| n == expected), "{expected} is missing");
    }

    let s = std::fs::read_to_string(dir.path().join("pair_distribution-Si-O.dat"))?;
    assert!(s.starts_with('#'));
    assert_eq!(s.lines().count(), 301);
    Ok(())
}
