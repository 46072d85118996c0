//! Score a sample check-in for manual inspection

fn main() {
    let features = r#"{"rms": 0.1, "zcr": 0.05, "pauseRatio": 0.5, "speechRate": 2.0}"#;
    let self_report = r#"{"stress": 9, "fatigue": 7}"#;
    let baseline = r#"{"avgEnergy": 0.5, "avgStress": 5, "windowSize": 6}"#;

    match synheart_voice::score_check_in_json(features, self_report, baseline) {
        Ok(flags) => print!("{flags}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
