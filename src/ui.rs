pub fn render_index(date: &str) -> String {
    INDEX_HTML
        .replace("{{DATE}}", &escape_html(date))
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="de">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Civic Score</title>
  <style>
    :root {
      --bg-1: #f3f6f1;
      --bg-2: #cfe3d4;
      --ink: #23302a;
      --accent: #2f7d5b;
      --accent-2: #2f4858;
      --warn: #c63b2b;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e8f1ea 60%, #f6f8f4 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    h2 {
      margin: 0 0 10px;
      font-size: 1.2rem;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #5f6a64;
    }

    section {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .hidden {
      display: none;
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    input,
    select {
      padding: 10px 12px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      font-size: 1rem;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.secondary {
      background: var(--accent-2);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(32px, 1fr));
      gap: 6px;
    }

    .day {
      height: 32px;
      border-radius: 8px;
      display: grid;
      place-items: center;
      font-size: 0.75rem;
      background: #eef2ee;
    }

    .day.done {
      background: var(--accent);
      color: white;
    }

    .day.missed {
      background: #f3d6d1;
    }

    .day.today {
      outline: 2px solid var(--accent-2);
    }

    .actions {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 6px 16px;
    }

    .negative {
      color: var(--warn);
    }

    .question {
      display: grid;
      gap: 6px;
      margin-bottom: 12px;
    }

    .status {
      min-height: 1.2em;
      color: #5f6a64;
    }

    .status[data-type="error"] {
      color: var(--warn);
    }

    .status[data-type="ok"] {
      color: var(--accent);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    td,
    th {
      text-align: left;
      padding: 6px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Civic Score</h1>
      <p class="subtitle">Heute: <span id="date">{{DATE}}</span></p>
    </header>

    <p id="status" class="status"></p>

    <section id="account">
      <h2>Konto</h2>
      <div id="logged-out" class="row">
        <input id="username" placeholder="Benutzername" autocomplete="username" />
        <input id="password" type="password" placeholder="Passwort" autocomplete="current-password" />
        <button id="login-btn" type="button">Anmelden</button>
        <button id="register-btn" class="secondary" type="button">Registrieren</button>
      </div>
      <div id="logged-in" class="row hidden">
        <span>Angemeldet als <strong id="me-name"></strong></span>
        <button id="logout-btn" class="secondary" type="button">Abmelden</button>
      </div>
    </section>

    <section id="join" class="hidden">
      <h2>Challenge</h2>
      <div class="row">
        <select id="switcher"></select>
        <input id="join-code" placeholder="Code" maxlength="12" />
        <button id="join-btn" type="button">Beitreten</button>
      </div>
    </section>

    <section id="today" class="hidden">
      <h2 id="challenge-title"></h2>
      <p id="challenge-meta" class="hint"></p>
      <div id="day-grid" class="grid"></div>
      <p id="score-line"></p>
      <form id="entry-form">
        <div id="questions"></div>
        <div id="actions" class="actions"></div>
        <p>
          <button type="submit">Tag speichern</button>
          <span id="preview" class="hint"></span>
        </p>
      </form>
      <div id="final-stats" class="hidden"></div>
    </section>

    <section id="history-section" class="hidden">
      <h2>Verlauf</h2>
      <table>
        <thead><tr><th>Datum</th><th>Challenge</th><th>Punkte</th><th>+</th><th>-</th></tr></thead>
        <tbody id="history"></tbody>
      </table>
    </section>

    <section id="admin" class="hidden">
      <h2>Admin</h2>
      <div class="row">
        <input id="c-title" placeholder="Titel" />
        <input id="c-start" type="date" />
        <input id="c-end" type="date" />
        <label><input id="c-ab" type="checkbox" /> A/B</label>
        <button id="create-btn" type="button">Anlegen</button>
      </div>
      <table>
        <thead><tr><th>Titel</th><th>Code</th><th>Zeitraum</th><th>A/B</th><th></th></tr></thead>
        <tbody id="challenges"></tbody>
      </table>
    </section>

    <p class="hint">Version {{VERSION}}</p>
  </main>

  <script>
    const $ = (id) => document.getElementById(id);
    let currentView = null;
    let firstAnswerAt = null;
    let lastAnswerAt = null;

    function setStatus(text, type) {
      const el = $("status");
      el.textContent = text || "";
      el.dataset.type = type || "";
    }

    function esc(value) {
      return String(value ?? "").replace(/[&<>"']/g, (c) => ({
        "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;"
      })[c]);
    }

    async function api(path, options = {}) {
      const init = { credentials: "same-origin", ...options };
      if (init.body && typeof init.body !== "string") {
        init.headers = { "Content-Type": "application/json", ...(init.headers || {}) };
        init.body = JSON.stringify(init.body);
      }
      const res = await fetch(path, init);
      const data = await res.json().catch(() => ({}));
      if (!res.ok) {
        throw new Error(data.error || res.statusText);
      }
      return data;
    }

    function markAnswered() {
      const now = new Date().toISOString();
      if (!firstAnswerAt) firstAnswerAt = now;
      lastAnswerAt = now;
      refreshPreview();
    }

    function renderQuestion(q) {
      const name = `q-${esc(q.id)}`;
      let input = "";
      if (q.type === "boolean") {
        input = `<input type="checkbox" name="${name}" data-qid="${esc(q.id)}" data-kind="boolean" />`;
      } else if (q.type === "number" || q.type === "stars") {
        const max = q.type === "stars" ? ` min="0" max="${q.stars || 5}"` : "";
        input = `<input type="number"${max} name="${name}" data-qid="${esc(q.id)}" data-kind="number" />`;
      } else if (q.type === "select") {
        const opts = (q.items || []).map((i) => `<option value="${esc(i.id)}">${esc(i.label)}</option>`).join("");
        input = `<select name="${name}" data-qid="${esc(q.id)}" data-kind="text"><option value=""></option>${opts}</select>`;
      } else {
        input = `<input name="${name}" data-qid="${esc(q.id)}" data-kind="text" />`;
      }
      return `<label class="question"><span>${esc(q.label)}</span>${input}</label>`;
    }

    function renderQuestions(view) {
      const sets = view.questions || {};
      const blocks = [
        ["Vorher-Quiz", sets.pre],
        ["Nachher-Quiz", sets.post],
        ["Tagesfragen", sets.daily],
        ["Zusatzfragen", sets.defined],
        ["Wochenfragen", sets.weekly],
      ];
      $("questions").innerHTML = blocks
        .filter(([, qs]) => qs && qs.length)
        .map(([title, qs]) => `<h3>${esc(title)}</h3>${qs.map(renderQuestion).join("")}`)
        .join("");
      for (const el of document.querySelectorAll("[data-qid]")) {
        const prev = (view.answers || {})[el.dataset.qid];
        if (prev !== undefined) {
          if (el.dataset.kind === "boolean") el.checked = prev === true;
          else el.value = prev;
        }
        el.addEventListener("change", markAnswered);
      }
    }

    async function renderActions(view) {
      if (view.show_only_pre) {
        $("actions").innerHTML = "";
        return;
      }
      const actions = await api("/api/actions");
      const selected = new Set(view.selected_actions || []);
      $("actions").innerHTML = actions.map((a) => `
        <label class="${a.polarity === "negative" ? "negative" : ""}">
          <input type="checkbox" data-action="${esc(a.id)}" ${selected.has(a.id) ? "checked" : ""} />
          ${esc(a.label)} <small>(${esc(a.category)}${view.scores_visible ? `, ${a.weight > 0 ? "+" : ""}${a.weight}` : ""})</small>
        </label>`).join("");
      for (const el of document.querySelectorAll("[data-action]")) {
        el.addEventListener("change", markAnswered);
      }
    }

    function collectEntry() {
      const answers = {};
      for (const el of document.querySelectorAll("[data-qid]")) {
        if (el.dataset.kind === "boolean") {
          if (el.checked) answers[el.dataset.qid] = true;
        } else if (el.value !== "") {
          answers[el.dataset.qid] = el.dataset.kind === "number" ? Number(el.value) : el.value;
        }
      }
      const selected = [...document.querySelectorAll("[data-action]:checked")].map((el) => el.dataset.action);
      return { selected, answers };
    }

    async function refreshPreview() {
      if (!currentView || !currentView.challenge || !currentView.scores_visible) {
        $("preview").textContent = "";
        return;
      }
      const body = { ...collectEntry(), challenge_code: currentView.challenge.code };
      try {
        const score = await api("/api/score/preview", { method: "POST", body });
        $("preview").textContent = `Vorschau: ${score.total} Punkte`;
      } catch (err) {
        $("preview").textContent = "";
      }
    }

    function renderToday(view) {
      currentView = view;
      firstAnswerAt = null;
      lastAnswerAt = null;
      const c = view.challenge;
      $("today").classList.toggle("hidden", !c);
      if (!c) return;
      $("challenge-title").textContent = c.title;
      $("challenge-meta").textContent = `${c.start_date} bis ${c.end_date} (${c.duration_days} Tage), Code ${c.code}`;
      $("day-grid").innerHTML = view.days.map((d) => `
        <div class="day ${d.status}${d.is_today ? " today" : ""}" title="${esc(d.date)}">
          ${d.score !== undefined && d.has_entry ? esc(d.score) : esc(d.date.slice(8))}
        </div>`).join("");
      $("score-line").textContent = view.running_total !== undefined
        ? `Heute: ${view.today_score} Punkte, gesamt: ${view.running_total}`
        : "";
      const open = !view.before_start && !view.after_end;
      $("entry-form").classList.toggle("hidden", !open);
      if (view.before_start) setStatus("Die Challenge hat noch nicht begonnen.");
      if (open) {
        renderQuestions(view);
        renderActions(view);
      }
      const stats = view.stats;
      $("final-stats").classList.toggle("hidden", !stats);
      if (stats) {
        $("final-stats").innerHTML = `
          <p>Tage mit Eintrag: ${stats.days_with_entry} von ${stats.total_days} (${stats.completion_rate}%)</p>
          <p>Längste Serie: ${stats.longest_streak} Tage, Aktionen: ${stats.total_actions}</p>
          ${stats.total_score !== undefined ? `<p>Punkte: ${stats.total_score}, Schnitt: ${stats.avg_score_active}</p>` : ""}`;
      }
    }

    async function loadSwitcher() {
      const items = await api("/api/memberships");
      $("switcher").innerHTML = items.map((i) =>
        `<option value="${esc(i.code)}" ${i.selected ? "selected" : ""}>${esc(i.title)}${i.open_today ? " *" : ""}</option>`
      ).join("");
      $("switcher").classList.toggle("hidden", items.length === 0);
    }

    async function loadHistory() {
      const rows = await api("/api/history");
      $("history-section").classList.toggle("hidden", rows.length === 0);
      $("history").innerHTML = rows.map((r) => `
        <tr><td>${esc(r.date)}</td><td>${esc(r.challenge_code || "")}</td><td>${esc(r.total_score)}</td>
        <td>${esc(r.positive)}</td><td>${esc(r.negative)}</td></tr>`).join("");
    }

    async function loadAdmin() {
      const list = await api("/api/admin/challenges");
      $("challenges").innerHTML = list.map((c) => `
        <tr>
          <td>${esc(c.title)}</td><td>${esc(c.code)}</td><td>${esc(c.start_date)} bis ${esc(c.end_date)}</td>
          <td><button type="button" class="secondary" data-toggle="${esc(c.id)}">${c.ab_enabled ? "an" : "aus"}</button></td>
          <td><a href="/api/admin/challenges/${encodeURIComponent(c.id)}/export">Export</a></td>
        </tr>`).join("");
      for (const el of document.querySelectorAll("[data-toggle]")) {
        el.addEventListener("click", async () => {
          await api(`/api/admin/challenges/${encodeURIComponent(el.dataset.toggle)}/ab-toggle`, { method: "POST" });
          await loadAdmin();
        });
      }
    }

    async function refresh() {
      const me = await api("/api/me");
      $("logged-out").classList.toggle("hidden", me.is_logged_in);
      $("logged-in").classList.toggle("hidden", !me.is_logged_in);
      $("join").classList.toggle("hidden", !me.is_logged_in);
      $("admin").classList.toggle("hidden", !me.is_admin);
      if (!me.is_logged_in) {
        $("today").classList.add("hidden");
        $("history-section").classList.add("hidden");
        if (!$("username").value) {
          const suggestion = await api("/api/username/suggest");
          $("username").placeholder = suggestion.username;
        }
        return;
      }
      $("me-name").textContent = me.username;
      const pendingJoin = new URLSearchParams(location.search).get("join");
      if (pendingJoin) {
        await api("/api/join", { method: "POST", body: { code: pendingJoin } });
        history.replaceState(null, "", "/");
      }
      const params = new URLSearchParams(location.search);
      const query = params.has("dev") ? `?${params.toString()}` : "";
      await loadSwitcher();
      renderToday(await api(`/api/today${query}`));
      await loadHistory();
      if (me.is_admin) await loadAdmin();
    }

    async function run(task) {
      try {
        setStatus("");
        await task();
      } catch (err) {
        setStatus(err.message, "error");
      }
    }

    async function account(path) {
      const username = $("username").value.trim() || $("username").placeholder;
      await api(path, { method: "POST", body: { username, password: $("password").value } });
      $("password").value = "";
      await refresh();
    }

    $("login-btn").addEventListener("click", () => run(() => account("/api/auth/login")));
    $("register-btn").addEventListener("click", () => run(() => account("/api/auth/register")));
    $("logout-btn").addEventListener("click", () => run(async () => {
      await api("/api/auth/logout", { method: "POST" });
      await refresh();
    }));
    $("join-btn").addEventListener("click", () => run(async () => {
      await api("/api/join", { method: "POST", body: { code: $("join-code").value } });
      $("join-code").value = "";
      await refresh();
      setStatus("Beigetreten.", "ok");
    }));
    $("switcher").addEventListener("change", () => run(async () => {
      await api("/api/challenge/select", { method: "POST", body: { code: $("switcher").value } });
      await refresh();
    }));
    $("entry-form").addEventListener("submit", (event) => {
      event.preventDefault();
      run(async () => {
        const body = {
          ...collectEntry(),
          challenge_code: currentView.challenge.code,
          first_answer_at: firstAnswerAt,
          last_answer_at: lastAnswerAt,
          submitted_at: new Date().toISOString(),
        };
        const res = await api("/api/submit", { method: "POST", body });
        await refresh();
        setStatus(currentView.scores_visible ? `Gespeichert: ${res.total} Punkte.` : "Gespeichert.", "ok");
      });
    });
    $("create-btn").addEventListener("click", () => run(async () => {
      await api("/api/admin/challenges", {
        method: "POST",
        body: {
          title: $("c-title").value,
          start: $("c-start").value,
          end: $("c-end").value,
          ab_enabled: $("c-ab").checked,
        },
      });
      $("c-title").value = "";
      await loadAdmin();
      setStatus("Challenge angelegt.", "ok");
    }));

    run(refresh);
  </script>
</body>
</html>
"#;
