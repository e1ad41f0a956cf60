pub(super) const INDEX_HTML: &str = r#"<!DOCTYPE html>
  <html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
    <title>GeoVet</title>
    <link
      rel="stylesheet"
      href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
      integrity="sha256-p4NxAoJBhIIN+hmNHrzRCf9tD/miZyoHS5obTRR9BMY="
      crossorigin=""
    />
    <style>
      html, body { height: 100%; margin: 0; padding: 0; }
      #controls {
        position: absolute;
        top: 12px;
        left: 50px;
        z-index: 1000;
        background: white;
        padding: 8px;
        border-radius: 4px;
        box-shadow: 0 1px 4px rgba(0,0,0,0.3);
        width: 280px;
        max-height: calc(100% - 40px);
        overflow-y: auto;
        font: 13px sans-serif;
      }
      #map { height: 100%; width: 100%; }
      fieldset {
        border: 1px solid #ccc;
        border-radius: 4px;
        margin: 6px 0;
        padding: 4px 6px;
      }
      fieldset label { display: block; margin: 3px 0; }
      fieldset input { width: 150px; float: right; }
      button.check {
        display: block;
        width: 100%;
        margin: 3px 0;
        padding: 4px;
        cursor: pointer;
      }
      #spinner {
        display: none;
        margin: 6px auto;
        border: 3px solid #eee;
        border-top: 3px solid #3388ff;
        border-radius: 50%;
        width: 18px;
        height: 18px;
        animation: spin 1s linear infinite;
      }
      @keyframes spin { to { transform: rotate(360deg); } }
      .result { margin: 6px 0; border-top: 1px solid #eee; padding-top: 4px; }
      .badge {
        padding: 1px 6px;
        border-radius: 3px;
        color: white;
        font-weight: bold;
      }
      .pass { background: #2e8b57; }
      .fail { background: #c0392b; }
      .failure-link {
        display: block;
        margin-left: 8px;
        color: #0066cc;
        text-decoration: underline;
        cursor: pointer;
      }
    </style>
  </head>
  <body>
    <div id="controls">
      <b>GeoVet</b>
      <div>
        <label for="inputType">Source: </label>
        <select id="inputType">
          <option value="csv">csv</option>
          <option value="postgres">postgres</option>
        </select>
      </div>
      <fieldset id="csvFields">
        <legend>CSV</legend>
        <label>Folder <input type="text" id="pathToCsv" /></label>
      </fieldset>
      <fieldset id="pgFields" style="display: none">
        <legend>Postgres</legend>
        <label>Host <input type="text" id="host" /></label>
        <label>Database <input type="text" id="database" /></label>
        <label>User <input type="text" id="user" /></label>
        <label>Password <input type="password" id="password" /></label>
        <label>Staging <input type="text" id="stagingPrefix" placeholder="comma-separated" /></label>
      </fieldset>
      <div id="tests"></div>
      <div id="spinner"></div>
      <div id="results"></div>
    </div>

    <div id="map"></div>

    <script
      src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
      integrity="sha256-20nQCchB9co0qIjJZRGuk2/Z9VM+kNiyxNV1lvTlZBo="
      crossorigin=""
    ></script>

    <script>
      const TESTS = [
        { path: 'testinvalidShape', label: 'Invalid shapes' },
        { path: 'testoverlappingpolygons', label: 'Overlapping polygons' },
        { path: 'testpointinpolygon', label: 'Point in polygon' },
        { path: 'testwgs84point', label: 'WGS84 point' },
        { path: 'testnullisland', label: 'Null island' },
        { path: 'testpolygonwithinparent', label: 'Polygon within parent' },
      ];

      // Property keys shown in feature popups, in display order
      const POPUP_KEYS = ['id', 'map_code', 'parent_id', 'class', 'en_us', 'none', 'fips', 'iso2', 'iso3'];

      const inputType = document.getElementById('inputType');
      const spinner = document.getElementById('spinner');

      // initialize map
      const map = L.map('map').setView([0, 0], 2);

      L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
        maxZoom: 16,
        attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
      }).addTo(map);

      let failureLayer = null;

      inputType.addEventListener('change', () => {
        document.getElementById('csvFields').style.display = inputType.value === 'csv' ? '' : 'none';
        document.getElementById('pgFields').style.display = inputType.value === 'postgres' ? '' : 'none';
      });

      function sourceParams() {
        const params = new URLSearchParams({ input_type: inputType.value });
        if (inputType.value === 'csv') {
          params.set('path_to_csv', document.getElementById('pathToCsv').value);
        } else {
          params.set('host', document.getElementById('host').value);
          params.set('database', document.getElementById('database').value);
          params.set('user', document.getElementById('user').value);
          params.set('password', document.getElementById('password').value);
          const staging = document.getElementById('stagingPrefix').value;
          if (staging) {
            params.set('staging_prefix', staging);
          }
        }
        return params;
      }

      async function runTest(test) {
        spinner.style.display = 'block';
        try {
          const res = await fetch(`/geocoding/${test.path}?${sourceParams()}`);
          if (!res.ok) {
            throw new Error(await res.text());
          }
          const failures = await res.json();
          showResult(test, failures);
        } catch (err) {
          alert(`${test.label}: ${err.message}`);
        } finally {
          spinner.style.display = 'none';
        }
      }

      function showResult(test, failures) {
        const keys = Object.keys(failures);
        let box = document.getElementById(`result-${test.path}`);
        if (!box) {
          box = document.createElement('div');
          box.id = `result-${test.path}`;
          box.className = 'result';
          document.getElementById('results').appendChild(box);
        }
        box.innerHTML = '';

        const badge = document.createElement('span');
        badge.className = keys.length === 0 ? 'badge pass' : 'badge fail';
        badge.textContent = keys.length === 0 ? 'PASS' : `FAIL (${keys.length})`;
        box.appendChild(badge);
        box.appendChild(document.createTextNode(` ${test.label}`));

        // One link per failing record; clicking pans the map to it
        keys.forEach(key => {
          const link = document.createElement('a');
          link.className = 'failure-link';
          link.textContent = key;
          link.addEventListener('click', () => showFailure(failures[key]));
          box.appendChild(link);
        });
      }

      function showFailure(payload) {
        if (failureLayer) {
          map.removeLayer(failureLayer);
        }

        // Payload is a Feature, a GeometryCollection or a list of geometries;
        // L.geoJSON handles all three
        failureLayer = L.geoJSON(payload, {
          onEachFeature: (feature, layer) => {
            if (!feature.properties) {
              return;
            }
            const rows = POPUP_KEYS
              .filter(k => feature.properties[k] !== null && feature.properties[k] !== undefined)
              .map(k => `<b>${k}</b>: ${feature.properties[k]}`);
            if (rows.length) {
              layer.bindPopup(rows.join('<br/>'));
            }
          },
        }).addTo(map);

        const bounds = failureLayer.getBounds();
        if (bounds.isValid()) {
          map.fitBounds(bounds, { maxZoom: 12 });
        }
      }

      const tests = document.getElementById('tests');
      TESTS.forEach(test => {
        const btn = document.createElement('button');
        btn.className = 'check';
        btn.textContent = test.label;
        btn.addEventListener('click', () => runTest(test));
        tests.appendChild(btn);
      });
    </script>
  </body>
  </html>
"#;
