use std::io::{Cursor, Read};

use log::{info, warn};
use serde_json::{json, Value};
use tiny_http::{Request, Response};

use sketch_nn::data::image::{canvas_to_input, input_to_png};
use sketch_nn::network::spec::IMAGE_SIDE;
use sketch_nn::ModelError;

use crate::routes::{html_response, json_download_response, json_error, json_response, not_found, png_response};
use crate::state::SharedState;

// The page is embedded at compile time so the binary runs from any directory.
const TEMPLATE: &str = include_str!("assets/sketchpad.html");

/// Upper bound on an uploaded canvas snapshot.
const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Training and test images are shown at twice their native size.
const SAMPLE_ZOOM: u32 = 2;

pub enum SampleKind {
    Train,
    Test,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_index() -> Response<Cursor<Vec<u8>>> {
    html_response(TEMPLATE.replace("{{INPUT_SIDE}}", &IMAGE_SIDE.to_string()))
}

// ---------------------------------------------------------------------------
// GET /status
// ---------------------------------------------------------------------------

/// Running accuracy, epoch progress, and the latest test guess as JSON.
pub fn handle_status(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    json_response(&status_json(state))
}

fn status_json(state: &SharedState) -> Value {
    let (stats, last) = {
        let session = state.session();
        (session.stats(), session.last_report().cloned())
    };
    json!({
        "stats": stats,
        "last": last,
        "paused": state.is_paused(),
        "halted": state.is_halted(),
    })
}

// ---------------------------------------------------------------------------
// GET /sample/{train,test}.png
// ---------------------------------------------------------------------------

/// Renders the sample used by the latest tick.
pub fn handle_sample(state: &SharedState, kind: SampleKind) -> Response<Cursor<Vec<u8>>> {
    let inputs = {
        let session = state.session();
        let sample = session.last_report().and_then(|report| match kind {
            SampleKind::Train => session.training_sample(report.trained_index),
            SampleKind::Test => session.testing_sample(report.tested_index),
        });
        match sample {
            Some(sample) => sample.inputs(),
            None => return not_found(),
        }
    };

    match input_to_png(&inputs, IMAGE_SIDE, SAMPLE_ZOOM) {
        Ok(Some(png)) => png_response(png),
        Ok(None) => not_found(),
        Err(e) => json_error(500, &e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// POST /guess
// ---------------------------------------------------------------------------

/// Classifies the user's drawing. The body is the canvas encoded as an image
/// (the page sends PNG); it is down-sampled to the network's input size.
pub fn handle_guess(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().take(MAX_UPLOAD_BYTES).read_to_end(&mut body) {
        return json_error(400, &format!("could not read body: {}", e));
    }

    match guess_drawing(&body, state) {
        Ok(value) => json_response(&value),
        Err((status, message)) => json_error(status, &message),
    }
}

/// Decodes and classifies a canvas image. Errors carry the HTTP status to
/// answer with.
fn guess_drawing(body: &[u8], state: &SharedState) -> Result<Value, (u16, String)> {
    let input = canvas_to_input(body, IMAGE_SIDE).map_err(|e| (400, e.to_string()))?;
    let (guess, outputs) = state.session().classify(&input).map_err(|e| {
        warn!("drawing rejected: {}", e);
        (422, e.to_string())
    })?;
    Ok(json!({ "guess": guess, "outputs": outputs }))
}

// ---------------------------------------------------------------------------
// POST /pause, POST /continue
// ---------------------------------------------------------------------------

pub fn handle_pause(state: &SharedState, paused: bool) -> Response<Cursor<Vec<u8>>> {
    state.set_paused(paused);
    info!("training {}", if paused { "paused" } else { "resumed" });
    json_response(&json!({ "paused": paused }))
}

// ---------------------------------------------------------------------------
// POST /save, GET /model.json
// ---------------------------------------------------------------------------

/// Writes the current parameters to the configured model path.
pub fn handle_save(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    match save_model(state) {
        Ok(()) => {
            info!("model saved to {}", state.save_path.display());
            json_response(&json!({ "saved": state.save_path.display().to_string() }))
        }
        Err(e) => {
            warn!("saving model failed: {}", e);
            json_error(500, &e.to_string())
        }
    }
}

fn save_model(state: &SharedState) -> Result<(), ModelError> {
    // The session lock is held only for the clone.
    let network = state.session().network().clone();
    network.save_json(&state.save_path)
}

/// Serves the current parameters as a downloadable JSON file.
pub fn handle_download(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let network = state.session().network().clone();
    match serde_json::to_string_pretty(&network) {
        Ok(body) => json_download_response(body, "model.json"),
        Err(e) => json_error(500, &e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
    use sketch_nn::{NeuralNetwork, Sample, TrainConfig, TrainingSession};

    use super::*;
    use crate::state::SketchState;

    fn state_with(input_nodes: usize, save_path: std::path::PathBuf) -> SharedState {
        let nn = NeuralNetwork::with_seed(input_nodes, 8, 10, 0.1, 3).unwrap();
        let samples = vec![
            Sample::new(1, vec![255.0; input_nodes]),
            Sample::new(0, vec![0.0; input_nodes]),
        ];
        let session =
            TrainingSession::new(nn, samples.clone(), samples, &TrainConfig::default()).unwrap();
        Arc::new(SketchState::new(session, save_path))
    }

    /// A white vertical stroke on a black canvas, encoded as PNG.
    fn drawn_one() -> Vec<u8> {
        let mut canvas = GrayImage::new(140, 140);
        for y in 30..110 {
            for x in 62..78 {
                canvas.put_pixel(x, y, Luma([255]));
            }
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn guess_classifies_png_drawing() {
        let side = IMAGE_SIDE as usize;
        let state = state_with(side * side, std::env::temp_dir().join("unused.json"));
        let png = drawn_one();

        let value = guess_drawing(&png, &state).unwrap();
        let outputs: Vec<f64> = serde_json::from_value(value["outputs"].clone()).unwrap();
        assert_eq!(outputs.len(), 10);
        assert!(outputs.iter().all(|&v| v > 0.0 && v < 1.0));

        let input = canvas_to_input(&png, IMAGE_SIDE).unwrap();
        let (expected, _) = state.session().classify(&input).unwrap();
        assert_eq!(value["guess"], expected);
    }

    #[test]
    fn guess_rejects_undecodable_body() {
        let side = IMAGE_SIDE as usize;
        let state = state_with(side * side, std::env::temp_dir().join("unused.json"));
        let (status, _) = guess_drawing(b"not an image", &state).unwrap_err();
        assert_eq!(status, 400);
    }

    #[test]
    fn guess_rejects_network_of_other_input_size() {
        let state = state_with(4, std::env::temp_dir().join("unused.json"));
        let (status, message) = guess_drawing(&drawn_one(), &state).unwrap_err();
        assert_eq!(status, 422);
        assert!(message.contains("query"), "{}", message);
    }

    #[test]
    fn status_reflects_ticks_and_pause() {
        let state = state_with(4, std::env::temp_dir().join("unused.json"));
        assert!(status_json(&state)["last"].is_null());

        state.session().tick().unwrap();
        state.session().tick().unwrap();
        state.set_paused(true);

        let value = status_json(&state);
        assert_eq!(value["stats"]["ticks"], 2);
        assert_eq!(value["paused"], true);
        assert_eq!(value["halted"], false);
        assert_eq!(value["last"]["trained_index"], 1);
    }

    #[test]
    fn save_writes_reloadable_model() {
        let path = std::env::temp_dir()
            .join(format!("sketchpad-save-{}.json", std::process::id()));
        let state = state_with(4, path.clone());
        state.session().tick().unwrap();

        save_model(&state).unwrap();
        let loaded = NeuralNetwork::load_json(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(&loaded.unwrap(), state.session().network());
    }
}
