#![allow(dead_code)]

use std::path::{Path, PathBuf};

use incidence_race::{EncoderKind, FrameSize, RunConfig};

pub const HEADER: &str = "regiao,estado,municipio,coduf,codmun,data,semanaEpi,populacaoTCU2019,casosAcumulado,casosNovos,obitosAcumulado\n";

/// Fresh scratch directory under `target/`.
pub fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("it").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_icons(dir: &Path, codes: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for (i, code) in codes.iter().enumerate() {
        let shade = (40 * i % 256) as u8;
        image::RgbaImage::from_pixel(30, 21, image::Rgba([shade, 120, 200, 255]))
            .save_with_format(dir.join(format!("{code}.png")), image::ImageFormat::Png)
            .unwrap();
    }
}

/// `(region_scope, code, municipality, date, population, cumulative_cases)`
pub fn write_csv(path: &Path, rows: &[(&str, &str, &str, &str, &str, u64)]) {
    let mut s = String::from(HEADER);
    for (scope, code, muni, date, pop, cases) in rows {
        s.push_str(&format!(
            "{scope},{code},{muni},11,,{date},14,{pop},{cases},0,0\n"
        ));
    }
    std::fs::write(path, s).unwrap();
}

/// Three dates, three states, plus rows the filter must drop.
pub fn standard_rows() -> Vec<(&'static str, &'static str, &'static str, &'static str, &'static str, u64)> {
    vec![
        ("Brasil", "", "", "01/04/2020", "210147125", 6836),
        ("Sudeste", "SP", "", "01/04/2020", "1000", 10),
        ("Sudeste", "RJ", "", "01/04/2020", "2000", 10),
        ("Norte", "AM", "", "01/04/2020", "1000", 2),
        ("Sudeste", "SP", "Campinas", "01/04/2020", "500", 400),
        ("Brasil", "", "", "02/04/2020", "210147125", 7910),
        ("Sudeste", "SP", "", "02/04/2020", "1000", 20),
        ("Sudeste", "RJ", "", "02/04/2020", "2000", 20),
        ("Norte", "AM", "", "02/04/2020", "1000", 30),
        ("Sudeste", "SP", "", "03/04/2020", "1000", 40),
        ("Sudeste", "RJ", "", "03/04/2020", "2000", 40),
        ("Norte", "AM", "", "03/04/2020", "1000", 40),
    ]
}

pub fn config_in(dir: &Path) -> RunConfig {
    RunConfig {
        input: dir.join("input.csv"),
        icon_dir: dir.join("icons"),
        frames_dir: dir.join("figs"),
        animation_out: dir.join("figs").join("out.gif"),
        frame_size: FrameSize {
            width: 200,
            height: 200,
        },
        encoder: EncoderKind::None,
        ..RunConfig::default()
    }
}
