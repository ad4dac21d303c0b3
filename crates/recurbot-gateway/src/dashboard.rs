//! Management page served at `/`.
//!
//! Static markup; the page fetches `/api/templates` and renders cards
//! client-side.

/// Return the management page HTML.
pub fn dashboard_html() -> &'static str {
    DASHBOARD_HTML
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Recurbot — Recurring Telegram Posts</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet">
  <style>
    .container { max-width: 900px; }
    .template-card { margin-bottom: 20px; }
    .template-message { white-space: pre-wrap; }
  </style>
</head>
<body>
  <div class="container py-4">
    <h1 class="mb-4">Recurbot</h1>

    <div class="row">
      <div class="col-md-8">
        <h2>Your Templates</h2>
        <div id="templates-container" class="mb-4">
          <div class="d-flex justify-content-center">
            <div class="spinner-border" role="status">
              <span class="visually-hidden">Loading...</span>
            </div>
          </div>
        </div>
      </div>

      <div class="col-md-4">
        <div class="card">
          <div class="card-header">Create New Template</div>
          <div class="card-body">
            <form id="new-template-form" action="/api/templates" method="post">
              <div class="mb-3">
                <label for="name" class="form-label">Template Name</label>
                <input type="text" class="form-control" id="name" name="name" required>
              </div>

              <div class="mb-3">
                <label for="message" class="form-label">Message Content</label>
                <textarea class="form-control" id="message" name="message" rows="4" required></textarea>
              </div>

              <div class="row mb-3">
                <div class="col-6">
                  <label for="intervalValue" class="form-label">Repeat Every</label>
                  <input type="number" class="form-control" id="intervalValue" name="intervalValue" min="1" value="24" required>
                </div>
                <div class="col-6">
                  <label for="intervalUnit" class="form-label">Unit</label>
                  <select class="form-select" id="intervalUnit" name="intervalUnit">
                    <option value="minutes">Minutes</option>
                    <option value="hours" selected>Hours</option>
                    <option value="days">Days</option>
                  </select>
                </div>
              </div>

              <div class="mb-3 form-check">
                <input type="checkbox" class="form-check-input" id="includeImage" name="includeImage" value="true">
                <label class="form-check-label" for="includeImage">Include Image</label>
              </div>

              <div class="mb-3" id="imageUrlField" style="display: none;">
                <label for="imageUrl" class="form-label">Image URL</label>
                <input type="url" class="form-control" id="imageUrl" name="imageUrl">
              </div>

              <button type="submit" class="btn btn-primary">Create Template</button>
            </form>
          </div>
        </div>
      </div>
    </div>
  </div>

  <script>
    function esc(value) {
      const div = document.createElement('div');
      div.textContent = value == null ? '' : String(value);
      return div.innerHTML;
    }

    document.getElementById('includeImage').addEventListener('change', function () {
      document.getElementById('imageUrlField').style.display = this.checked ? 'block' : 'none';
    });

    async function loadTemplates() {
      const container = document.getElementById('templates-container');
      try {
        const response = await fetch('/api/templates');
        const templates = await response.json();

        if (!Array.isArray(templates) || templates.length === 0) {
          container.innerHTML = '<div class="alert alert-info">No templates yet. Create your first one!</div>';
          return;
        }

        container.innerHTML = templates.map(t => {
          const lastSent = t.lastSentTime ? new Date(t.lastSentTime).toLocaleString() : 'Never sent';
          const image = t.includeImage ? `<p class="text-muted">Includes image: ${esc(t.imageUrl)}</p>` : '';
          return `
            <div class="card template-card">
              <div class="card-header d-flex justify-content-between align-items-center">
                <h5 class="m-0">${esc(t.name)}</h5>
                <div>
                  <button data-id="${esc(t.id)}" class="btn btn-sm btn-primary send-now">Send Now</button>
                  <button data-id="${esc(t.id)}" class="btn btn-sm btn-danger delete">Delete</button>
                </div>
              </div>
              <div class="card-body">
                <p class="card-text template-message">${esc(t.message)}</p>
                <p class="text-muted">Repeats every ${esc(t.intervalValue)} ${esc(t.intervalUnit)}</p>
                <p class="text-muted">Last sent: ${esc(lastSent)}</p>
                ${image}
              </div>
            </div>`;
        }).join('');

        container.querySelectorAll('.send-now').forEach(b => b.addEventListener('click', () => sendNow(b.dataset.id)));
        container.querySelectorAll('.delete').forEach(b => b.addEventListener('click', () => deleteTemplate(b.dataset.id)));
      } catch (error) {
        console.error('Error loading templates:', error);
        container.innerHTML = '<div class="alert alert-danger">Error loading templates</div>';
      }
    }

    async function sendNow(id) {
      try {
        const response = await fetch(`/api/send/${encodeURIComponent(id)}`, { method: 'POST' });
        const result = await response.json();
        if (result.ok) {
          alert('Message sent successfully!');
        } else {
          alert('Error: ' + (result.description || result.error || 'Unknown error'));
        }
        loadTemplates();
      } catch (error) {
        console.error('Error sending template:', error);
        alert('Error sending template');
      }
    }

    async function deleteTemplate(id) {
      if (!confirm('Are you sure you want to delete this template?')) return;
      try {
        const response = await fetch(`/api/templates/${encodeURIComponent(id)}`, { method: 'DELETE' });
        const result = await response.json();
        if (result.success) {
          loadTemplates();
        } else {
          alert('Error: ' + (result.error || 'Unknown error'));
        }
      } catch (error) {
        console.error('Error deleting template:', error);
        alert('Error deleting template');
      }
    }

    document.addEventListener('DOMContentLoaded', loadTemplates);
  </script>
</body>
</html>
"##;
