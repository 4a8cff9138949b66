use crate::infrastructure::render::ffmpeg::Scene;

/// Lays the display script out against the narration timeline.
///
/// The script's lines are cut into contiguous chunks, one per narration
/// segment (fewer when the script has fewer lines than there are segments).
/// Each chunk stays on screen for a share of `duration` proportional to the
/// words spoken over it. Windows are back to back from 0 to `duration`.
pub fn plan(display_script: &str, segments: &[String], duration: f64) -> Vec<Scene> {
    let lines: Vec<&str> = display_script.lines().collect();
    if lines.is_empty() {
        return vec![Scene {
            text: String::new(),
            start: 0.0,
            end: duration,
        }];
    }

    let weights: Vec<usize> = if segments.is_empty() {
        vec![1]
    } else {
        segments.iter().map(|s| s.split_whitespace().count().max(1)).collect()
    };

    let chunks = weights.len().min(lines.len()).max(1);
    let chunk_weights: Vec<usize> = even_ranges(weights.len(), chunks)
        .map(|(from, to)| weights[from..to].iter().sum())
        .collect();
    let total: usize = chunk_weights.iter().sum();

    let mut scenes = Vec::with_capacity(chunks);
    let mut spoken = 0usize;
    for ((from, to), weight) in even_ranges(lines.len(), chunks).zip(chunk_weights) {
        let start = duration * spoken as f64 / total as f64;
        spoken += weight;
        let end = if spoken == total {
            duration
        } else {
            duration * spoken as f64 / total as f64
        };

        scenes.push(Scene {
            text: lines[from..to].join("\n"),
            start,
            end,
        });
    }
    scenes
}

/// Splits `0..len` into `parts` contiguous, near-equal ranges.
fn even_ranges(len: usize, parts: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..parts).map(move |i| (i * len / parts, (i + 1) * len / parts))
}
