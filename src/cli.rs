use voicemorph::analysis::pitch::{DEFAULT_PITCH_SKIP_SECS, DEFAULT_PITCH_WINDOW_SECS};
use voicemorph::io::{contour, scratch, wav};
use voicemorph::{
    track_pitch, AudioBuffer, F0Mapping, FrameMode, MorphError, SmoothingParams, SmoothingSource,
    TransformParams, DEFAULT_MAX_F0, DEFAULT_MIN_F0,
};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let mut pitch_scale: Option<f64> = None;
    let mut time_scale: Option<f64> = None;
    let mut energy_scale: Option<f64> = None;
    let mut vtl_scale: Option<f64> = None;
    let mut f0_path: Option<String> = None;
    let mut save_f0_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut smooth: Option<usize> = None;
    let mut smooth_mapped = false;
    let mut smooth_ratio = false;
    let mut target_mean: Option<f64> = None;
    let mut target_std: Option<f64> = None;
    let mut fixed_rate = false;
    let mut scratch_path: Option<String> = None;
    let mut format_float = false;
    let mut normalize = false;
    let mut verbose = false;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--pitch" | "-p" => {
                i += 1;
                pitch_scale = Some(parse_f64(&args, i, "pitch"));
            }
            "--time" | "-t" => {
                i += 1;
                time_scale = Some(parse_f64(&args, i, "time"));
            }
            "--energy" | "-e" => {
                i += 1;
                energy_scale = Some(parse_f64(&args, i, "energy"));
            }
            "--vtl" => {
                i += 1;
                vtl_scale = Some(parse_f64(&args, i, "vtl"));
            }
            "--f0" => {
                i += 1;
                f0_path = Some(require_value(&args, i, "f0"));
            }
            "--save-f0" => {
                i += 1;
                save_f0_path = Some(require_value(&args, i, "save-f0"));
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(require_value(&args, i, "config"));
            }
            "--smooth" => {
                i += 1;
                smooth = Some(parse_usize(&args, i, "smooth"));
            }
            "--smooth-mapped" => smooth_mapped = true,
            "--smooth-ratio" => smooth_ratio = true,
            "--target-mean" => {
                i += 1;
                target_mean = Some(parse_f64(&args, i, "target-mean"));
            }
            "--target-std" => {
                i += 1;
                target_std = Some(parse_f64(&args, i, "target-std"));
            }
            "--fixed-rate" => fixed_rate = true,
            "--scratch" => {
                i += 1;
                scratch_path = Some(require_value(&args, i, "scratch"));
            }
            "--float" => format_float = true,
            "--normalize" | "-n" => normalize = true,
            "--verbose" | "-v" => verbose = true,
            other => {
                eprintln!("ERROR: Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let input = match wav::read_wav_file(input_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "Input: {} samples, {} Hz, {:.2}s",
        input.data.len(),
        input.sample_rate,
        input.duration_secs()
    );

    // Parameters: config file first, command line flags override.
    let mut params = match &config_path {
        Some(path) => match load_config(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("ERROR: Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => TransformParams::new(input.sample_rate),
    };
    params.sample_rate = input.sample_rate;

    if let Some(p) = pitch_scale {
        params = params.with_pitch_scale(p);
    }
    if let Some(t) = time_scale {
        params = params.with_time_scale(t);
    }
    if let Some(e) = energy_scale {
        params = params.with_energy_scale(e);
    }
    if let Some(v) = vtl_scale {
        params = params.with_vocal_tract_scale(v);
    }
    if fixed_rate {
        params = params.with_frame_mode(FrameMode::FixedRate {
            window_secs: 0.020,
            skip_secs: 0.010,
        });
    }
    if let Some(neighbors) = smooth {
        let source = if smooth_ratio {
            SmoothingSource::RatioFilter
        } else if smooth_mapped {
            SmoothingSource::MappedLsfs
        } else {
            SmoothingSource::SourceLsfs
        };
        params = params.with_smoothing(SmoothingParams { source, neighbors });
    }
    if let (Some(mean), Some(std)) = (target_mean, target_std) {
        params.f0_mapping = F0Mapping::Statistics {
            target_mean: mean,
            target_std: std,
        };
    }

    // Pitch contour: from file, or tracked from the input.
    let pitch_contour = match &f0_path {
        Some(path) => match contour::read_contour_file(path) {
            Ok(c) => {
                eprintln!("Contour: {} frames from {}", c.len(), path);
                c
            }
            Err(e) => {
                eprintln!("ERROR: Failed to read contour {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            match track_pitch(
                &input.data,
                input.sample_rate,
                DEFAULT_PITCH_WINDOW_SECS,
                DEFAULT_PITCH_SKIP_SECS,
                DEFAULT_MIN_F0,
                DEFAULT_MAX_F0,
            ) {
                Ok(c) => {
                    let (mean, std) = c.voiced_statistics();
                    eprintln!("Tracked f0: mean {:.1} Hz, std {:.1} Hz", mean, std);
                    c
                }
                Err(e) => {
                    eprintln!("ERROR: Pitch tracking failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    if let Some(path) = &save_f0_path {
        if let Err(e) = contour::write_contour_file(path, &pitch_contour) {
            eprintln!("ERROR: Failed to write contour {}: {}", path, e);
            std::process::exit(1);
        }
        eprintln!("Contour saved to {}", path);
    }

    if verbose {
        eprintln!("  Sample rate: {} Hz", params.sample_rate);
        eprintln!("  Periods per frame: {}", params.num_periods);
        eprintln!("  LPC order: {}", params.effective_lpc_order());
        eprintln!("  Pre-emphasis: {:.2}", params.preemphasis);
        eprintln!("  Window: {:?}", params.window);
        eprintln!("  Frame mode: {:?}", params.frame_mode);
        eprintln!("  Smoothing: {:?}", params.smoothing);
    }

    let start = std::time::Instant::now();

    let mut output = match voicemorph::transform_with_contour(&input, &pitch_contour, &params) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("ERROR: Transformation failed: {}", e);
            std::process::exit(1);
        }
    };

    let elapsed = start.elapsed();

    // Spool the raw samples through a scratch file before packaging. The
    // repackaging step normalizes clipping streams on its own.
    if let Some(path) = &scratch_path {
        output = match spool_through_scratch(path, &output) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("ERROR: Scratch file {}: {}", path, e);
                std::process::exit(1);
            }
        };
    }

    if normalize || output.peak() > 1.0 {
        let scale = scratch::normalize_clipping(&mut output.data);
        if scale < 1.0 {
            eprintln!("Normalized by {:.3}", scale);
        }
    }

    eprintln!(
        "Output: {} samples, {:.2}s ({:.0} ms)",
        output.data.len(),
        output.duration_secs(),
        elapsed.as_secs_f64() * 1000.0
    );

    let result = if format_float {
        wav::write_wav_file_float(output_path, &output)
    } else {
        wav::write_wav_file_16bit(output_path, &output)
    };
    if let Err(e) = result {
        eprintln!("ERROR: Failed to write {}: {}", output_path, e);
        std::process::exit(1);
    }
    eprintln!("Wrote {}", output_path);
}

fn print_usage() {
    eprintln!("Usage: voicemorph <input.wav> <output.wav> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --pitch, -p <factor>   Pitch scale factor (>1.0 raises pitch)");
    eprintln!("  --time, -t <factor>    Time scale factor (>1.0 lengthens)");
    eprintln!("  --energy, -e <factor>  Energy scale factor");
    eprintln!("  --vtl <factor>         Vocal tract length factor");
    eprintln!("  --f0 <file>            Read pitch contour from binary file");
    eprintln!("  --save-f0 <file>       Save the pitch contour used");
    eprintln!("  --config, -c <file>    Load parameters from JSON");
    eprintln!("  --smooth <n>           Smooth vocal tract over n neighbors");
    eprintln!("  --smooth-mapped        Smooth mapped LSFs instead of source");
    eprintln!("  --smooth-ratio         Smooth the vocal tract correction filter");
    eprintln!("  --target-mean <hz>     Map f0 onto these target statistics");
    eprintln!("  --target-std <hz>        (requires both mean and std)");
    eprintln!("  --fixed-rate           Fixed-rate frames instead of pitch-sync");
    eprintln!("  --scratch <file>       Spool raw samples through a scratch file");
    eprintln!("  --float                Write 32-bit float WAV output");
    eprintln!("  --normalize, -n        Peak-normalize the output");
    eprintln!("  --verbose, -v          Print parameter details");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  voicemorph in.wav out.wav --pitch 1.5");
    eprintln!("  voicemorph in.wav out.wav -p 0.8 -t 1.2 --smooth 3");
    eprintln!("  voicemorph in.wav out.wav --config transform.json");
}

fn spool_through_scratch(path: &str, output: &AudioBuffer) -> Result<AudioBuffer, MorphError> {
    let file = std::fs::File::create(path)?;
    let mut writer = scratch::ScratchWriter::new(std::io::BufWriter::new(file));
    writer.write_samples(&output.data)?;
    writer.finish()?;

    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    scratch::repackage(&mut reader, output.sample_rate)
}

fn load_config(path: &str) -> Result<TransformParams, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let params: TransformParams = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

fn require_value(args: &[String], idx: usize, name: &str) -> String {
    if idx >= args.len() {
        eprintln!("ERROR: Missing value for --{}", name);
        std::process::exit(1);
    }
    args[idx].clone()
}

fn parse_f64(args: &[String], idx: usize, name: &str) -> f64 {
    let raw = require_value(args, idx, name);
    match raw.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("ERROR: Invalid value for --{}: {}", name, raw);
            std::process::exit(1);
        }
    }
}

fn parse_usize(args: &[String], idx: usize, name: &str) -> usize {
    let raw = require_value(args, idx, name);
    match raw.parse::<usize>() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("ERROR: Invalid value for --{}: {}", name, raw);
            std::process::exit(1);
        }
    }
}
