<!DOCTYPE html>
<html>
  <body>
    <p>This page is not source code.</p>
  </body>
</html>
