//! Control panel page

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Reachy Mini Countdown</title>
<style>
  body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; background: #10121a; color: #f4f4f8; margin: 0; text-align: center; }
  main { max-width: 760px; margin: 0 auto; padding: 24px; }
  h1 { font-size: 2.2em; margin: 0.4em 0; }
  #clock { font-size: 5em; font-variant-numeric: tabular-nums; margin: 0.2em 0; }
  #phase { color: #9aa0b4; text-transform: uppercase; letter-spacing: 0.1em; }
  .final-ten #clock { color: #ff5a5a; }
  .celebrating #clock { color: #ffd24a; }
  .row { margin: 16px 0; display: flex; gap: 8px; justify-content: center; flex-wrap: wrap; }
  button { font-size: 1em; padding: 10px 18px; border: none; border-radius: 8px; cursor: pointer; }
  .start { background: #2ecc71; } .stop { background: #e74c3c; color: #fff; } .reset { background: #95a5a6; }
  input[type=number] { width: 90px; } input[type=url] { width: 360px; }
  input { font-size: 1em; padding: 8px; border-radius: 6px; border: 1px solid #444; }
  #camera img { max-width: 100%; border-radius: 10px; }
  #message { min-height: 1.4em; color: #9aa0b4; }
</style>
</head>
<body>
<main id="panel">
  <h1>{{EMOJI}} Reachy Mini Countdown {{EMOJI}}</h1>
  <div id="clock">00:00:00</div>
  <div id="phase">awaiting start</div>

  <div class="row">
    <input id="seconds" type="number" value="30" step="1">
    <button class="start" onclick="start()">Start</button>
    <button class="stop" onclick="post('/control/stop')">Stop</button>
    <button class="reset" onclick="post('/control/reset')">Reset</button>
  </div>

  <div class="row">
    <input id="music" type="url" value="{{MUSIC_URL}}">
    <button onclick="setMusic()">Set music</button>
  </div>

  <div class="row">
    <label><input id="speak" type="checkbox" {{SPEAK_CHECKED}} onchange="setSpeak()"> Speak every 10 seconds in the final minute</label>
  </div>

  <div id="message"></div>

  <div id="camera">{{CAMERA}}</div>
</main>
<script>
  const panel = document.getElementById('panel');
  const message = document.getElementById('message');

  async function post(path, body) {
    const options = { method: 'POST', headers: { 'Content-Type': 'application/json' } };
    if (body !== undefined) options.body = JSON.stringify(body);
    try {
      const response = await fetch(path, options);
      const data = await response.json();
      message.textContent = data.message || data.error || '';
    } catch (e) {
      message.textContent = 'Request failed: ' + e;
    }
  }

  function start() {
    post('/control/start', { seconds: Number(document.getElementById('seconds').value) });
  }

  function setMusic() {
    post('/control/music', { url: document.getElementById('music').value });
  }

  function setSpeak() {
    post('/control/speak-intervals', { enabled: document.getElementById('speak').checked });
  }

  async function refresh() {
    try {
      const data = await (await fetch('/countdown')).json();
      document.getElementById('clock').textContent = data.formatted;
      document.getElementById('phase').textContent = data.phase.replace('_', ' ');
      panel.className = data.phase.replace('_', '-');
    } catch (e) {}
  }

  setInterval(refresh, 250);
  refresh();
</script>
</body>
</html>
"##;

const LIVE_CAMERA: &str = r#"<img src="/video_feed" alt="Robot camera">"#;
const NO_CAMERA: &str = r#"<p>Camera not available</p>"#;

/// Render the control panel with the current settings.
pub fn render_page(emoji: &str, music_url: &str, speak_intervals: bool, camera_available: bool) -> String {
    TEMPLATE
        .replace("{{EMOJI}}", &escape_html(emoji))
        .replace("{{MUSIC_URL}}", &escape_html(music_url))
        .replace("{{SPEAK_CHECKED}}", if speak_intervals { "checked" } else { "" })
        .replace("{{CAMERA}}", if camera_available { LIVE_CAMERA } else { NO_CAMERA })
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let page = render_page("🥳", "https://example.com/a?b=1&c=2", true, false);
        assert!(page.contains("🥳 Reachy Mini Countdown 🥳"));
        assert!(page.contains("https://example.com/a?b=1&amp;c=2"));
        assert!(page.contains("checked"));
        assert!(page.contains("Camera not available"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_live_camera_embeds_stream() {
        let page = render_page("🎉", "", false, true);
        assert!(page.contains("/video_feed"));
        assert!(!page.contains(" checked "));
    }
}
