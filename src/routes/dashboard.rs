use axum::{
    http::header,
    response::{Html, IntoResponse},
};

pub async fn dashboard() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Html(DASHBOARD_HTML),
    )
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Dashboard dos sensores LDR e DHT22</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
    <style>
        :root {
            --bg: #f8fafc;
            --surface: #ffffff;
            --border: #e2e8f0;
            --text: #1e293b;
            --muted: #64748b;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: system-ui, -apple-system, sans-serif; background: var(--bg); color: var(--text); min-height: 100vh; }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            padding: 1.5rem;
        }
        h1 { font-size: 1.5rem; font-weight: 600; margin-bottom: 1.5rem; }
        h2 { font-size: 1.125rem; font-weight: 600; margin-bottom: 0.75rem; }

        .panel {
            background: var(--surface);
            border: 1px solid var(--border);
            border-radius: 0.5rem;
            padding: 1rem;
            margin-bottom: 1rem;
        }
        .chart {
            min-height: 420px;
        }
        .chart-placeholder {
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 420px;
            color: var(--muted);
            font-size: 0.875rem;
        }
    </style>
</head>
<body>
<div class="container">
    <h1>Dashboard dos sensores LDR e DHT22</h1>

    <div class="panel">
        <h2>Luminosity Data</h2>
        <div id="luminosity-graph" class="chart"></div>
    </div>

    <div class="panel">
        <h2>Humidity Data</h2>
        <div id="humidity-graph" class="chart"></div>
    </div>

    <div class="panel">
        <h2>Temperature Data</h2>
        <div id="temperature-graph" class="chart"></div>
    </div>
</div>

<script>
const SIGNALS = ['luminosity', 'humidity', 'temperature'];
const api = url => fetch(url).then(r => r.json());

function draw(signal, figure) {
    const el = document.getElementById(`${signal}-graph`);
    if (!figure.data || figure.data.length === 0) {
        Plotly.purge(el);
        el.innerHTML = '<div class="chart-placeholder">Waiting for data...</div>';
        return;
    }
    if (el.querySelector('.chart-placeholder')) {
        el.innerHTML = '';
    }
    Plotly.react(el, figure.data, figure.layout || {}, { responsive: true });
}

async function loadAll() {
    for (const signal of SIGNALS) {
        try {
            draw(signal, await api(`/api/signals/${signal}/figure`));
        } catch (e) {
            console.error(`Failed to load ${signal} figure:`, e);
        }
    }
}

function subscribe() {
    const source = new EventSource('/api/stream');
    for (const signal of SIGNALS) {
        source.addEventListener(signal, e => draw(signal, JSON.parse(e.data)));
    }
    source.onerror = () => console.warn('Figure stream interrupted, browser will reconnect');
}

loadAll().then(subscribe);
</script>
</body>
</html>
"##;
